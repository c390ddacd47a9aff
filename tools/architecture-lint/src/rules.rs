//! The ledger client's layering rules.

use crate::module_path::{ModulePath, Target};

/// One boundary the client's modules must respect.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Rule {
    /// Modules under `scope` must not reach any of `forbidden`.
    Forbid {
        scope: &'static str,
        forbidden: &'static [&'static str],
    },
    /// Each adapter under `layer` may reach only itself and `allowed`.
    ///
    /// An adapter is the module two levels down, such as `outbound::rest`.
    AdaptersReachOnly {
        layer: &'static str,
        allowed: &'static [&'static str],
    },
    /// External crate `krate` may only be named under one of `owners`.
    ///
    /// With no owners the crate belongs to the composition root alone.
    Confine {
        krate: &'static str,
        owners: &'static [&'static str],
    },
}

/// Rules applied to every layered module of the client.
pub(crate) const CLIENT_RULES: &[Rule] = &[
    Rule::Forbid {
        scope: "domain",
        forbidden: &["inbound", "outbound", "app", "config"],
    },
    Rule::Forbid {
        scope: "domain::ports",
        forbidden: &[
            "domain::access",
            "domain::auth_service",
            "domain::error_normalizer",
            "domain::session_context",
        ],
    },
    Rule::AdaptersReachOnly {
        layer: "inbound",
        allowed: &["domain", "app"],
    },
    Rule::AdaptersReachOnly {
        layer: "outbound",
        allowed: &["domain"],
    },
    Rule::Confine {
        krate: "reqwest",
        owners: &["outbound::rest", "outbound::firestore", "outbound::identity"],
    },
    Rule::Confine {
        krate: "cap_std",
        owners: &["outbound::storage"],
    },
    Rule::Confine {
        krate: "clap",
        owners: &["inbound::cli"],
    },
    Rule::Confine {
        krate: "color_eyre",
        owners: &[],
    },
    Rule::Confine {
        krate: "ortho_config",
        owners: &[],
    },
    Rule::Confine {
        krate: "tracing_subscriber",
        owners: &[],
    },
];

impl Rule {
    /// Message describing how `module` naming `target` breaks this rule.
    pub(crate) fn check(self, module: &ModulePath, target: &Target) -> Option<String> {
        match (self, target) {
            (Self::Forbid { scope, forbidden }, Target::Internal(path)) => {
                if !module.starts_with(&ModulePath::parse(scope)) {
                    return None;
                }
                let hit = forbidden
                    .iter()
                    .find(|root| path.starts_with(&ModulePath::parse(root)))?;
                Some(format!("{scope} must not depend on crate::{hit}"))
            }
            (Self::AdaptersReachOnly { layer, allowed }, Target::Internal(path)) => {
                let layer_path = ModulePath::parse(layer);
                if !module.starts_with(&layer_path) {
                    return None;
                }
                let adapter = module.truncated(2);
                let permitted = path.starts_with(&adapter)
                    || allowed
                        .iter()
                        .any(|root| path.starts_with(&ModulePath::parse(root)));
                if permitted {
                    return None;
                }
                let roots = allowed
                    .iter()
                    .map(|root| format!("crate::{root}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                Some(format!(
                    "{adapter} may only depend on itself and {roots}, not crate::{path}"
                ))
            }
            (Self::Confine { krate, owners }, Target::External(root)) => {
                if root != krate {
                    return None;
                }
                let owned = owners
                    .iter()
                    .any(|owner| module.starts_with(&ModulePath::parse(owner)));
                if owned {
                    return None;
                }
                Some(if owners.is_empty() {
                    format!("external crate `{krate}` belongs to the composition root")
                } else {
                    format!(
                        "external crate `{krate}` is confined to {}",
                        owners.join(", ")
                    )
                })
            }
            _ => None,
        }
    }
}

/// Every message `module` earns for naming `target`.
pub(crate) fn violations_for(module: &ModulePath, target: &Target) -> Vec<String> {
    CLIENT_RULES
        .iter()
        .filter_map(|rule| rule.check(module, target))
        .collect()
}
