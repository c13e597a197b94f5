/// Stat system constants and tunable parameters.
///
/// Compile-time constants describe the relationship between the host's native
/// attribute model and the custom one. Runtime-tunable values (scale factor,
/// host ceiling, tolerance) are carried by [`StatConfig`] instances so tests
/// and hosts can override them without touching the constants.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatConfig {
    /// Multiplier relating host-native units to custom units (custom = native × S).
    pub scale_factor: f64,
    /// Custom maximum health granted to privileged owners regardless of baseline.
    pub privileged_max_health: f64,
    /// Largest value the host-native mirror can represent safely.
    pub host_ceiling: f64,
    /// Tolerance used when comparing values across representations.
    pub epsilon: f64,
}

impl StatConfig {
    // ===== compile-time constants =====
    /// Host-native to custom scale factor (20 native health → 100 custom).
    pub const SCALE_FACTOR: f64 = 5.0;
    /// Default maximum health for players.
    pub const PLAYER_DEFAULT_MAX_HEALTH: f64 = 100.0;
    /// Maximum health the host-native attribute accepts.
    pub const NATIVE_MAX_HEALTH_LIMIT: f64 = 1024.0;
    /// Values above this are legal but flagged as beyond the recommended range.
    pub const RECOMMENDED_MAX_VALUE: f64 = 10_000.0;
    /// Large finite stand-in for "unbounded" where a finite number is required.
    pub const SAFE_INFINITY_VALUE: f64 = 1_000_000.0;
    /// Default comparison tolerance.
    pub const VALUE_EPSILON: f64 = 0.001;

    pub fn new() -> Self {
        Self {
            scale_factor: Self::SCALE_FACTOR,
            privileged_max_health: Self::PLAYER_DEFAULT_MAX_HEALTH,
            host_ceiling: Self::NATIVE_MAX_HEALTH_LIMIT,
            epsilon: Self::VALUE_EPSILON,
        }
    }

    pub fn with_scale_factor(scale_factor: f64) -> Self {
        Self {
            scale_factor,
            ..Self::new()
        }
    }

    /// Returns true if `value` exceeds the recommended maximum.
    pub fn is_beyond_recommended(value: f64) -> bool {
        value > Self::RECOMMENDED_MAX_VALUE
    }

    /// Approximate equality under [`Self::VALUE_EPSILON`].
    pub fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < Self::VALUE_EPSILON
    }

    /// Maps a value into the range the host-native mirror can hold.
    ///
    /// Non-finite values and values above the ceiling become the ceiling.
    pub fn host_safe(&self, value: f64) -> f64 {
        if !value.is_finite() || value > self.host_ceiling {
            self.host_ceiling
        } else {
            value
        }
    }
}

impl Default for StatConfig {
    fn default() -> Self {
        Self::new()
    }
}
