//! mixgate config checker.
//!
//! Loads a filter config with the same strict rules the proxy uses and logs
//! the policy every configured service resolves to.

use std::process::ExitCode;

use tracing_subscriber::{fmt, EnvFilter};

use mixgate_control::config::{self, PerRouteConfig};
use mixgate_control::{Controller, ControllerOptions};

fn main() -> ExitCode {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "mixgate.yaml".to_string());

    let cfg = match config::load_from_file(&path) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!(%path, error = %e, code = e.code().as_str(), "config rejected");
            return ExitCode::FAILURE;
        }
    };

    let services: Vec<String> = cfg.filter.services.keys().cloned().collect();
    tracing::info!(
        %path,
        fail_open = cfg.filter.fail_open(),
        disable_tcp_check_calls = cfg.filter.disable_tcp_check_calls,
        services = services.len(),
        "config ok"
    );

    let controller = Controller::new(ControllerOptions {
        config: cfg.filter,
        ..Default::default()
    });
    for name in services {
        let ctx = controller.service_context(&PerRouteConfig {
            destination_service: name.clone(),
            legacy: None,
        });
        tracing::info!(
            service = %name,
            check = ctx.enable_check(),
            report = ctx.enable_report(),
            attributes = ctx.attributes().len(),
            forward_attributes = ctx.forward_attributes().len(),
            "service policy"
        );
    }

    ExitCode::SUCCESS
}
