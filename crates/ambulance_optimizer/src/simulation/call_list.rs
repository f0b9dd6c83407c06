use std::sync::Arc;

use fxhash::FxHashMap;
use jiff::civil::DateTime;
use parking_lot::{RwLock, RwLockUpgradableReadGuard};

use crate::problem::incident::{Incident, IncidentIdx};

use super::{config::SimulationConfig, event::Call};

/// Calls of a simulation window in ascending time.
pub type CallList = Arc<Vec<(DateTime, Call)>>;

/// Call lists memoized per config, each list is built once.
#[derive(Default)]
pub struct CallListCache {
    lists: RwLock<FxHashMap<SimulationConfig, CallList>>,
}

impl CallListCache {
    pub fn get_or_build(&self, config: &SimulationConfig, incidents: &[Incident]) -> CallList {
        if let Some(calls) = self.lists.read().get(config) {
            return Arc::clone(calls);
        }

        // Only one upgradable reader at a time, concurrent misses wait here
        let guard = self.lists.upgradable_read();
        if let Some(calls) = guard.get(config) {
            return Arc::clone(calls);
        }

        let calls = Arc::new(build_call_list(config, incidents));
        let mut guard = RwLockUpgradableReadGuard::upgrade(guard);
        guard.insert(config.clone(), Arc::clone(&calls));

        calls
    }

    pub fn len(&self) -> usize {
        self.lists.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.read().is_empty()
    }
}

/// Incidents received strictly between `start - buffer` and `end`, expects them sorted by
/// call time. Only calls after `start` are scored.
pub fn build_call_list(config: &SimulationConfig, incidents: &[Incident]) -> Vec<(DateTime, Call)> {
    let warm_up_start = config.warm_up_start();
    let first = incidents.partition_point(|incident| incident.call_received <= warm_up_start);
    let last = incidents.partition_point(|incident| incident.call_received < config.end);

    (first..last.max(first))
        .map(|index| {
            let incident = &incidents[index];
            let call = Call::new(
                IncidentIdx::new(index),
                incident,
                incident.call_received > config.start,
            );
            (incident.call_received, call)
        })
        .collect()
}
