//! Route and operator usage counters.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use tt_core::{Timestamp, TransportType};

/// Operator key used when a route carries no operator.
pub const UNKNOWN_OPERATOR: &str = "unknown";

/// Counters for one route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteUsage {
    pub route_id:  String,
    pub count:     u64,
    pub operator:  String,
    pub transport: TransportType,
    pub last_used: Timestamp,
}

/// Per-route counters in first-seen order plus per-(operator, type) counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "UsageRepr")]
pub struct UsageStats {
    routes:    Vec<RouteUsage>,
    operators: BTreeMap<String, BTreeMap<TransportType, u64>>,
    #[serde(skip)]
    by_id:     FxHashMap<String, usize>,
}

#[derive(Deserialize)]
struct UsageRepr {
    #[serde(default)]
    routes:    Vec<RouteUsage>,
    #[serde(default)]
    operators: BTreeMap<String, BTreeMap<TransportType, u64>>,
}

impl From<UsageRepr> for UsageStats {
    fn from(repr: UsageRepr) -> Self {
        let by_id = repr
            .routes
            .iter()
            .enumerate()
            .map(|(i, r)| (r.route_id.clone(), i))
            .collect();
        Self { routes: repr.routes, operators: repr.operators, by_id }
    }
}

impl UsageStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one on-route ping against `route_id` and its operator.
    ///
    /// The operator and transport type recorded for the route are those of
    /// the most recent call.
    pub fn record(&mut self, route_id: &str, operator: Option<&str>, transport: TransportType, at: Timestamp) {
        let operator = operator
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .unwrap_or(UNKNOWN_OPERATOR);

        match self.by_id.get(route_id) {
            Some(&i) => {
                let entry = &mut self.routes[i];
                entry.count += 1;
                entry.last_used = at;
                if entry.operator != operator {
                    entry.operator = operator.to_owned();
                }
                entry.transport = transport;
            }
            None => {
                self.by_id.insert(route_id.to_owned(), self.routes.len());
                self.routes.push(RouteUsage {
                    route_id:  route_id.to_owned(),
                    count:     1,
                    operator:  operator.to_owned(),
                    transport,
                    last_used: at,
                });
            }
        }

        *self
            .operators
            .entry(operator.to_owned())
            .or_default()
            .entry(transport)
            .or_insert(0) += 1;
    }

    /// The `limit` most used routes, count descending; ties keep first-seen
    /// order.
    pub fn popular(&self, limit: usize) -> Vec<(String, u64)> {
        let mut ranked: Vec<&RouteUsage> = self.routes.iter().collect();
        // Stable: equal counts stay in first-seen order.
        ranked.sort_by(|a, b| b.count.cmp(&a.count));
        ranked
            .into_iter()
            .take(limit)
            .map(|r| (r.route_id.clone(), r.count))
            .collect()
    }

    pub fn operators(&self) -> &BTreeMap<String, BTreeMap<TransportType, u64>> {
        &self.operators
    }

    pub fn routes(&self) -> &[RouteUsage] {
        &self.routes
    }

    pub fn route(&self, route_id: &str) -> Option<&RouteUsage> {
        self.by_id.get(route_id).map(|&i| &self.routes[i])
    }

    pub fn total_uses(&self) -> u64 {
        self.routes.iter().map(|r| r.count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
