//! Servo engine preferences.
//!
//! Thread pools are sized from the CPU count (clamped), then the `[engine]`
//! config section is applied on top. Page features (JavaScript, local
//! storage, WebGL) keep the engine defaults, which have them enabled.

use tracing::info;

use crate::config::EngineConfig;

/// Builds Servo `Preferences` for this machine and config.
#[allow(clippy::field_reassign_with_default)]
pub fn build_servo_preferences(config: &EngineConfig) -> servo::Preferences {
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get() as i64)
        .unwrap_or(4);

    let mut prefs = servo::Preferences::default();

    prefs.layout_threads = layout_threads(config.layout_threads, cpus);
    prefs.threadpools_async_runtime_workers_max = (cpus * 2).min(16);
    prefs.threadpools_image_cache_workers_max = cpus.min(8);
    prefs.threadpools_webrender_workers_max = (cpus / 2).clamp(2, 8);
    prefs.threadpools_resource_workers_max = cpus.min(8);
    prefs.network_http_cache_size = config.cache_size.max(0);
    prefs.gfx_precache_shaders = config.precache_shaders;

    if !config.user_agent.trim().is_empty() {
        prefs.user_agent = config.user_agent.clone();
    }

    info!(
        cpus,
        layout_threads = prefs.layout_threads,
        cache_size = prefs.network_http_cache_size,
        custom_user_agent = !config.user_agent.trim().is_empty(),
        "Servo preferences configured"
    );

    prefs
}

/// `0` means auto: one per CPU, at most 8. Explicit values are kept but
/// never below 1.
fn layout_threads(configured: i64, cpus: i64) -> i64 {
    if configured <= 0 {
        cpus.clamp(1, 8)
    } else {
        configured
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_threads_auto() {
        assert_eq!(layout_threads(0, 4), 4);
        assert_eq!(layout_threads(0, 32), 8);
        assert_eq!(layout_threads(-3, 0), 1);
        assert_eq!(layout_threads(12, 4), 12);
    }

    #[test]
    fn test_preferences_from_default_config() {
        let prefs = build_servo_preferences(&EngineConfig::default());
        assert!(prefs.layout_threads >= 1 && prefs.layout_threads <= 8);
        assert_eq!(prefs.network_http_cache_size, 50_000);
        assert!(prefs.gfx_precache_shaders);
        assert!(prefs.threadpools_webrender_workers_max >= 2);
        assert!(prefs.threadpools_webrender_workers_max <= 8);
    }

    #[test]
    fn test_user_agent_override() {
        let config = EngineConfig {
            user_agent: "KaliBrowser/0.1".to_string(),
            ..EngineConfig::default()
        };
        assert_eq!(build_servo_preferences(&config).user_agent, "KaliBrowser/0.1");
    }

    #[test]
    fn test_blank_user_agent_keeps_engine_default() {
        let default_ua = servo::Preferences::default().user_agent;
        let config = EngineConfig {
            user_agent: "   ".to_string(),
            ..EngineConfig::default()
        };
        assert_eq!(build_servo_preferences(&config).user_agent, default_ua);
    }

    #[test]
    fn test_negative_cache_size_clamped() {
        let config = EngineConfig {
            cache_size: -1,
            ..EngineConfig::default()
        };
        assert_eq!(build_servo_preferences(&config).network_http_cache_size, 0);
    }
}
