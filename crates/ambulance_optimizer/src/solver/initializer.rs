use std::{fmt::Display, str::FromStr};

use rand::{Rng, seq::IteratorRandom};
use serde::{Deserialize, Serialize};

use crate::{
    error::ParamsError,
    problem::{
        allocation::Allocation, base_station::BaseStationIdx, service_region::ServiceRegion,
    },
    simulation::config::SimulationConfig,
};

/// Strategy producing the starting allocations of an optimizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Initializer {
    #[default]
    Random,
    Uniform,
    UniformRandom,
    PopulationProportionate,
    AllCityCenter,
}

impl Initializer {
    pub fn initialize<R: Rng>(
        &self,
        region: &ServiceRegion,
        config: &SimulationConfig,
        rng: &mut R,
    ) -> Allocation {
        Allocation::new(
            self.initialize_shift(region, config.num_ambulances_day, rng),
            self.initialize_shift(region, config.num_ambulances_night, rng),
        )
    }

    pub fn initialize_shift<R: Rng>(
        &self,
        region: &ServiceRegion,
        num_ambulances: usize,
        rng: &mut R,
    ) -> Vec<BaseStationIdx> {
        let num_base_stations = region.num_base_stations();

        match self {
            Initializer::Random => (0..num_ambulances)
                .map(|_| BaseStationIdx::new(rng.random_range(0..num_base_stations)))
                .collect(),
            Initializer::Uniform => (0..num_ambulances)
                .map(|index| BaseStationIdx::new(index % num_base_stations))
                .collect(),
            Initializer::UniformRandom => {
                let mut stations = Vec::with_capacity(num_ambulances);
                while stations.len() + num_base_stations <= num_ambulances {
                    stations.extend(BaseStationIdx::all(num_base_stations));
                }

                let remaining = num_ambulances - stations.len();
                stations.extend(BaseStationIdx::all(num_base_stations).choose_multiple(rng, remaining));
                stations
            }
            Initializer::PopulationProportionate => {
                population_proportionate(region.population_distribution(), num_ambulances)
            }
            Initializer::AllCityCenter => vec![region.city_center(); num_ambulances],
        }
    }
}

/// Rounded population shares, repaired on the stations that deviate the most.
pub fn population_proportionate(distribution: &[f64], num_ambulances: usize) -> Vec<BaseStationIdx> {
    let fair_counts = distribution
        .iter()
        .map(|proportion| proportion * num_ambulances as f64)
        .collect::<Vec<_>>();

    let mut stations = fair_counts
        .iter()
        .enumerate()
        .flat_map(|(station, fair)| {
            std::iter::repeat_n(BaseStationIdx::new(station), fair.round() as usize)
        })
        .collect::<Vec<_>>();

    // Most over-provisioned first
    let mut deviations = fair_counts
        .iter()
        .enumerate()
        .map(|(station, fair)| (fair - fair.round(), BaseStationIdx::new(station)))
        .collect::<Vec<_>>();
    deviations.sort_by(|(a, _), (b, _)| a.total_cmp(b));

    if stations.len() > num_ambulances {
        let surplus = stations.len() - num_ambulances;
        for &(_, station) in deviations.iter().take(surplus) {
            if let Some(position) = stations.iter().position(|&s| s == station) {
                stations.remove(position);
            }
        }
    } else {
        let deficit = num_ambulances - stations.len();
        for &(_, station) in deviations.iter().rev().take(deficit) {
            stations.push(station);
        }
    }

    stations
}

impl FromStr for Initializer {
    type Err = ParamsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "random" => Ok(Initializer::Random),
            "uniform" => Ok(Initializer::Uniform),
            "uniform_random" => Ok(Initializer::UniformRandom),
            "population_proportionate" => Ok(Initializer::PopulationProportionate),
            "all_city_center" => Ok(Initializer::AllCityCenter),
            _ => Err(ParamsError::UnknownName {
                kind: "initializer",
                value: s.to_owned(),
            }),
        }
    }
}

impl Display for Initializer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Initializer::Random => "random",
            Initializer::Uniform => "uniform",
            Initializer::UniformRandom => "uniform_random",
            Initializer::PopulationProportionate => "population_proportionate",
            Initializer::AllCityCenter => "all_city_center",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::SmallRng};

    use crate::{problem::shift::ShiftType, test_utils};

    use super::*;

    #[test]
    fn test_initializers_respect_lengths() {
        let region = test_utils::create_test_region(vec![]);
        let config = test_utils::create_test_config(7, 4);
        let mut rng = SmallRng::seed_from_u64(1);

        for initializer in [
            Initializer::Random,
            Initializer::Uniform,
            Initializer::UniformRandom,
            Initializer::PopulationProportionate,
            Initializer::AllCityCenter,
        ] {
            let allocation = initializer.initialize(&region, &config, &mut rng);
            assert!(allocation.validate(3, 7, 4).is_ok(), "{initializer}");
        }
    }

    #[test]
    fn test_uniform_random_covers_every_station() {
        let region = test_utils::create_test_region(vec![]);
        let mut rng = SmallRng::seed_from_u64(7);

        let stations = Initializer::UniformRandom.initialize_shift(&region, 8, &mut rng);
        let allocation = Allocation::new(stations, vec![]);
        let counts = allocation.station_counts(ShiftType::Day, 3);

        assert_eq!(counts.iter().sum::<usize>(), 8);
        assert!(counts.iter().all(|&count| count == 2 || count == 3));
    }

    #[test]
    fn test_population_proportionate_is_fair() {
        // Shares of 0.5, 0.333 and 0.167
        let distribution = [0.5, 1.0 / 3.0, 1.0 / 6.0];

        for num_ambulances in [1, 5, 7, 39] {
            let stations = population_proportionate(&distribution, num_ambulances);
            assert_eq!(stations.len(), num_ambulances);

            let counts = Allocation::new(stations, vec![]).station_counts(ShiftType::Day, 3);
            for (count, proportion) in counts.iter().zip(distribution) {
                let fair = proportion * num_ambulances as f64;
                assert!((*count as f64 - fair).abs() < 1.0, "{num_ambulances}: {counts:?}");
            }
        }
    }

    #[test]
    fn test_parse_initializer() {
        assert_eq!(
            "population-proportionate".parse::<Initializer>(),
            Ok(Initializer::PopulationProportionate)
        );
        assert!(matches!(
            "greedy".parse::<Initializer>(),
            Err(ParamsError::UnknownName { kind: "initializer", .. })
        ));
    }
}
