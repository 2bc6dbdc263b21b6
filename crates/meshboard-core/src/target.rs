// ── Target taxonomy ──
//
// The closed set of entity classes the dashboard fetches and stores.
// Every target is described by a static descriptor: fetchable targets
// carry an endpoint path, composite targets carry the constituent list
// their derived count is summed from. Exhaustive matches keep the table
// honest — adding a variant without a descriptor is a compile error.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumCount, EnumIter};

/// An entity class fetched from the controller and stored as a unit.
///
/// Fetchable targets map 1:1 onto REST collections. [`Client`](Target::Client)
/// and [`Device`](Target::Device) are *composite*: they are never fetched or
/// ingested directly — their observed value is a count derived from the
/// constituent tables.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter, EnumCount,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Target {
    // ── Fetchable ────────────────────────────────────────────────────
    WiredClient,
    WirelessClient,
    AccessPoint,
    Switch,
    Gateway,
    Network,
    WifiNetwork,
    FirewallRule,
    Account,

    // ── Composite (derived counts only) ──────────────────────────────
    Client,
    Device,
}

/// Static descriptor for one target.
struct TargetSpec {
    /// REST collection path under `/api/s/{site}/`, `None` for composites.
    path: Option<&'static str>,
    /// Constituent targets a composite count sums over; empty otherwise.
    constituents: &'static [Target],
}

const fn spec(target: Target) -> TargetSpec {
    match target {
        Target::WiredClient => TargetSpec {
            path: Some("rest/client/wired"),
            constituents: &[],
        },
        Target::WirelessClient => TargetSpec {
            path: Some("rest/client/wireless"),
            constituents: &[],
        },
        Target::AccessPoint => TargetSpec {
            path: Some("rest/accesspoint"),
            constituents: &[],
        },
        Target::Switch => TargetSpec {
            path: Some("rest/switch"),
            constituents: &[],
        },
        Target::Gateway => TargetSpec {
            path: Some("rest/gateway"),
            constituents: &[],
        },
        Target::Network => TargetSpec {
            path: Some("rest/network"),
            constituents: &[],
        },
        Target::WifiNetwork => TargetSpec {
            path: Some("rest/wlan"),
            constituents: &[],
        },
        Target::FirewallRule => TargetSpec {
            path: Some("rest/firewallrule"),
            constituents: &[],
        },
        Target::Account => TargetSpec {
            path: Some("rest/account"),
            constituents: &[],
        },
        Target::Client => TargetSpec {
            path: None,
            constituents: &[Target::WiredClient, Target::WirelessClient],
        },
        Target::Device => TargetSpec {
            path: None,
            constituents: &[Target::AccessPoint, Target::Switch, Target::Gateway],
        },
    }
}

impl Target {
    /// REST collection path for fetchable targets, `None` for composites.
    pub fn endpoint_path(self) -> Option<&'static str> {
        spec(self).path
    }

    /// Constituents a composite's count sums over (empty for fetchable targets).
    pub fn constituents(self) -> &'static [Target] {
        spec(self).constituents
    }

    /// `true` if this target's value is derived rather than fetched.
    pub fn is_composite(self) -> bool {
        spec(self).path.is_none()
    }

    /// `true` if this target maps to a REST collection.
    pub fn is_fetchable(self) -> bool {
        spec(self).path.is_some()
    }

    /// Composite targets whose derived count includes `self`.
    pub fn composites(self) -> impl Iterator<Item = Target> {
        <Self as strum::IntoEnumIterator>::iter()
            .filter(move |c| c.constituents().contains(&self))
    }

    /// All fetchable targets, in declaration order.
    pub fn fetchable() -> impl Iterator<Item = Target> {
        <Self as strum::IntoEnumIterator>::iter().filter(|t| t.is_fetchable())
    }

    /// Dense index for per-target storage arrays.
    #[allow(clippy::as_conversions)]
    pub(crate) const fn index(self) -> usize {
        self as usize
    }
}
