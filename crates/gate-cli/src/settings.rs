//! gatekeep configuration: the shared sections plus `[approval]`

use gate_approval::{ApprovalConfig, OperationPolicy};
use gate_core::{AppConfig, ConfigSource, LayeredConfig};
use gate_tools::office::{
    EMERGENCY_BUDGET_INCREASE, MAKE_COMPANY_PURCHASE, PURCHASE_BASIC_ITEM,
    PURCHASE_EXPENSIVE_ITEM, PURCHASE_LUXURY_ITEM,
};
use serde::Deserialize;
use std::path::Path;

/// Company purchases at or below this cost go through without review
pub const COMPANY_PURCHASE_LIMIT: f64 = 500.0;

#[derive(Debug, Clone, Default)]
pub struct GatekeepConfig {
    pub app: AppConfig,
    pub approval: OfficeApproval,
}

/// `[approval]` with the office operations filled in when none are listed
#[derive(Debug, Clone, Deserialize)]
#[serde(from = "ApprovalConfig")]
pub struct OfficeApproval(pub ApprovalConfig);

impl From<ApprovalConfig> for OfficeApproval {
    fn from(mut config: ApprovalConfig) -> Self {
        if config.operations.is_empty() {
            config.operations = office_operations().operations;
        }
        Self(config)
    }
}

impl Default for OfficeApproval {
    fn default() -> Self {
        Self(office_operations())
    }
}

/// Every spending tool is reviewed; company purchases only above the limit
fn office_operations() -> ApprovalConfig {
    ApprovalConfig::default()
        .with_operation(PURCHASE_BASIC_ITEM, OperationPolicy::always_require())
        .with_operation(PURCHASE_EXPENSIVE_ITEM, OperationPolicy::always_require())
        .with_operation(PURCHASE_LUXURY_ITEM, OperationPolicy::always_require())
        .with_operation(EMERGENCY_BUDGET_INCREASE, OperationPolicy::always_require())
        .with_operation(
            MAKE_COMPANY_PURCHASE,
            OperationPolicy::threshold("cost", COMPANY_PURCHASE_LIMIT),
        )
}

/// Load `path` (or the defaults when it does not exist) plus `GATE__*` overrides
///
/// A file that exists but fails to parse is an error.
pub fn load(path: &Path) -> gate_core::Result<(GatekeepConfig, ConfigSource)> {
    let layered = LayeredConfig::load(path, false)?;
    let config = GatekeepConfig {
        app: layered.app()?,
        approval: layered.section("approval")?.unwrap_or_default(),
    };
    Ok((config, layered.source()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gate_approval::Verdict;
    use serde_json::json;
    use std::io::Write;
    use std::sync::{Mutex, MutexGuard};

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    /// Serializes tests that read or set `GATE__*` variables
    fn env_lock() -> MutexGuard<'static, ()> {
        ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Removes the variable when the test ends
    struct EnvVar(&'static str);

    impl EnvVar {
        fn set(key: &'static str, value: &str) -> Self {
            std::env::set_var(key, value);
            Self(key)
        }
    }

    impl Drop for EnvVar {
        fn drop(&mut self) {
            std::env::remove_var(self.0);
        }
    }

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_gate_spending_tools() {
        let config = GatekeepConfig::default();
        let policy = config.approval.0.policy();

        assert_eq!(policy.gated_operations().len(), 5);
        let small = json!({"item": "Office chairs", "cost": 150});
        let large = json!({"item": "Tesla Model S", "cost": 89000});
        assert_eq!(
            policy.evaluate(MAKE_COMPANY_PURCHASE, small.as_object().unwrap()),
            Verdict::AutoApprove
        );
        assert_eq!(
            policy.evaluate(MAKE_COMPANY_PURCHASE, large.as_object().unwrap()),
            Verdict::RequireApproval
        );
        assert_eq!(config.app.agent.max_iterations, 5);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let _lock = env_lock();
        let (config, source) = load(Path::new("/nonexistent/gatekeep.toml")).unwrap();
        assert_eq!(source, ConfigSource::Defaults);
        assert_eq!(config.approval.0.default_channel, "console");
    }

    #[test]
    fn test_file_overrides_sections() {
        let _lock = env_lock();
        let file = write_config(
            r#"
[agent]
max_iterations = 3

[inference]
provider = "openai"
base_url = "https://api.openai.com/v1"
model = "gpt-4o"
api_key_env = "OPENAI_API_KEY"

[approval]
default_timeout_secs = 30
default_channel = "console"

[approval.operations.purchase_luxury_item]
timeout_secs = 120
rules = [{ when = "always", then = "require_approval" }]
"#,
        );

        let (config, source) = load(file.path()).unwrap();
        assert_eq!(source, ConfigSource::File);
        assert_eq!(config.app.agent.max_iterations, 3);
        assert_eq!(config.app.inference.model, "gpt-4o");
        assert_eq!(config.app.logging.level, "info");
        assert_eq!(config.approval.0.default_timeout_secs, 30);
        let policy = config.approval.0.policy();
        assert_eq!(policy.gated_operations(), vec!["purchase_luxury_item"]);
        assert_eq!(
            policy.operation("purchase_luxury_item").unwrap().timeout,
            Some(std::time::Duration::from_secs(120))
        );
    }

    #[test]
    fn test_shipped_config_matches_defaults() {
        let _lock = env_lock();
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../gatekeep.toml");
        let (config, source) = load(&path).unwrap();
        assert_eq!(source, ConfigSource::File);

        let shipped = config.approval.0.policy();
        let defaults = GatekeepConfig::default().approval.0.policy();
        assert_eq!(shipped.gated_operations(), defaults.gated_operations());

        let large = json!({"cost": 89000});
        assert_eq!(
            shipped.evaluate(MAKE_COMPANY_PURCHASE, large.as_object().unwrap()),
            Verdict::RequireApproval
        );
        assert_eq!(
            shipped.operation(PURCHASE_LUXURY_ITEM).unwrap().timeout,
            Some(std::time::Duration::from_secs(120))
        );
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let _lock = env_lock();
        let file = write_config("[agent]\nmax_iterations = \"many\"\n");
        assert!(load(file.path()).is_err());
    }

    #[test]
    fn test_env_overrides_shipped_config() {
        let _lock = env_lock();
        let _iterations = EnvVar::set("GATE__AGENT__MAX_ITERATIONS", "9");
        let _timeout = EnvVar::set("GATE__APPROVAL__DEFAULT_TIMEOUT_SECS", "45");

        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../gatekeep.toml");
        let (config, source) = load(&path).unwrap();

        assert_eq!(source, ConfigSource::File);
        assert_eq!(config.app.agent.max_iterations, 9);
        assert_eq!(config.approval.0.default_timeout_secs, 45);
        assert_eq!(config.approval.0.policy().gated_operations().len(), 5);
    }

    #[test]
    fn test_env_applies_when_file_is_missing() {
        let _lock = env_lock();
        let _iterations = EnvVar::set("GATE__AGENT__MAX_ITERATIONS", "7");
        let _timeout = EnvVar::set("GATE__APPROVAL__DEFAULT_TIMEOUT_SECS", "30");

        let (config, source) = load(Path::new("/nonexistent/gatekeep.toml")).unwrap();

        assert_eq!(source, ConfigSource::Defaults);
        assert_eq!(config.app.agent.max_iterations, 7);
        assert_eq!(config.approval.0.default_timeout_secs, 30);
        let policy = config.approval.0.policy();
        assert_eq!(policy.gated_operations().len(), 5);
        let large = json!({"cost": 89000});
        assert_eq!(
            policy.evaluate(MAKE_COMPANY_PURCHASE, large.as_object().unwrap()),
            Verdict::RequireApproval
        );
    }

    #[test]
    fn test_approval_without_operations_keeps_office_policy() {
        let _lock = env_lock();
        let file = write_config("[approval]\ndefault_channel = \"console\"\ndefault_timeout_secs = 20\n");

        let (config, _) = load(file.path()).unwrap();
        assert_eq!(config.approval.0.default_timeout_secs, 20);
        assert_eq!(
            config.approval.0.policy().gated_operations(),
            GatekeepConfig::default().approval.0.policy().gated_operations()
        );
    }
}
