//! Race weekend aggregation.

use crate::model::lifecycle::RecordId;
use crate::model::qualifying::Qualifying;
use crate::model::race::Race;
use crate::model::result::RaceResult;
use crate::repo::qualifying_repo::QualifyingRepository;
use crate::repo::race_repo::RaceRepository;
use crate::repo::result_repo::ResultRepository;
use crate::repo::RepoResult;
use log::debug;
use serde::{Deserialize, Serialize};

/// A race with its classification and qualifying order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceWeekend {
    pub race: Race,
    /// Ordered by `position_order`.
    pub results: Vec<RaceResult>,
    /// Ordered by qualifying position.
    pub qualifying: Vec<Qualifying>,
}

pub struct RaceService<R, S, Q>
where
    R: RaceRepository,
    S: ResultRepository,
    Q: QualifyingRepository,
{
    races: R,
    results: S,
    qualifying: Q,
}

impl<R, S, Q> RaceService<R, S, Q>
where
    R: RaceRepository,
    S: ResultRepository,
    Q: QualifyingRepository,
{
    pub fn new(races: R, results: S, qualifying: Q) -> Self {
        Self {
            races,
            results,
            qualifying,
        }
    }

    /// Loads a race and everything recorded for it; `NotFound` for an
    /// unknown race.
    pub fn race_weekend(&self, race_id: RecordId) -> RepoResult<RaceWeekend> {
        let race = self.races.get_race(race_id)?;
        let results = self.results.list_results_for_race(race.id)?;
        let qualifying = self.qualifying.list_qualifying_for_race(race.id)?;
        debug!(
            "event=race_weekend module=service status=ok race_id={} results={} qualifying={}",
            race.id,
            results.len(),
            qualifying.len()
        );
        Ok(RaceWeekend {
            race,
            results,
            qualifying,
        })
    }
}
