//! Season use-case service.
//!
//! # Invariants
//! - `races_for_year` resolves the season first; an unknown year is
//!   `NotFound` even though an empty race list would be a valid answer.
//! - Returned races are ordered by `round ASC` and all belong to the year.

use crate::model::race::Race;
use crate::model::season::Season;
use crate::repo::race_repo::RaceRepository;
use crate::repo::season_repo::SeasonRepository;
use crate::repo::RepoResult;
use log::debug;
use serde::{Deserialize, Serialize};

/// One season together with its calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonSchedule {
    pub season: Season,
    pub races: Vec<Race>,
}

/// Season service facade over repository implementations.
pub struct SeasonService<S: SeasonRepository, R: RaceRepository> {
    seasons: S,
    races: R,
}

impl<S: SeasonRepository, R: RaceRepository> SeasonService<S, R> {
    /// Creates a service using the provided repository implementations.
    pub fn new(seasons: S, races: R) -> Self {
        Self { seasons, races }
    }

    /// Returns the races of the season `year`, ordered by round.
    pub fn races_for_year(&self, year: i32) -> RepoResult<Vec<Race>> {
        Ok(self.schedule(year)?.races)
    }

    /// Returns the season `year` with its races ordered by round.
    pub fn schedule(&self, year: i32) -> RepoResult<SeasonSchedule> {
        let season = self.seasons.get_season(year)?;
        let races = self.races.list_races_for_season(season.id)?;
        debug!(
            "event=season_schedule module=service status=ok year={year} races={}",
            races.len()
        );
        Ok(SeasonSchedule { season, races })
    }
}
