use std::collections::HashMap;

use uuid::Uuid;

use crate::models::{ClassActivity, Institution, RouteLeg};

/// City-to-city road distances. Rows are inserted in both directions so
/// lookups are symmetric by construction.
#[derive(Debug, Clone, Default)]
pub struct DistanceMatrix {
    distances: HashMap<(String, String), f64>,
}

impl DistanceMatrix {
    pub fn from_rows(rows: &[(String, String, f64)]) -> Self {
        let mut matrix = DistanceMatrix::default();
        for (city_a, city_b, km) in rows {
            matrix.insert(city_a, city_b, *km);
        }
        matrix
    }

    pub fn insert(&mut self, city_a: &str, city_b: &str, km: f64) {
        self.distances
            .insert((city_a.to_string(), city_b.to_string()), km);
        self.distances
            .insert((city_b.to_string(), city_a.to_string()), km);
    }

    /// Road distance between two cities. Same city is always 0. A pair
    /// missing from the matrix resolves to 0 with a warning instead of
    /// failing, so one bad reference row cannot abort a settlement batch.
    pub fn distance(&self, city_a: &str, city_b: &str) -> (f64, Option<String>) {
        if city_a == city_b {
            return (0.0, None);
        }
        match self
            .distances
            .get(&(city_a.to_string(), city_b.to_string()))
        {
            Some(km) => (*km, None),
            None => (
                0.0,
                Some(format!(
                    "no distance entry for {city_a} -> {city_b}; travel leg counted as 0 km"
                )),
            ),
        }
    }
}

/// Closed-loop route for one day: home, each visited institution's city in
/// the order the classes were worked, back home. Consecutive visits to the
/// same institution collapse into one stop; two institutions sharing a city
/// stay separate stops. No reordering.
pub fn build_route(
    home_city: &str,
    classes: &[&ClassActivity],
    institutions: &HashMap<Uuid, Institution>,
) -> (Vec<String>, Vec<String>) {
    let mut route = vec![home_city.to_string()];
    let mut warnings = Vec::new();
    let mut last_institution: Option<Uuid> = None;

    for class in classes {
        if last_institution == Some(class.institution_id) {
            continue;
        }
        last_institution = Some(class.institution_id);
        match institutions.get(&class.institution_id) {
            Some(institution) => route.push(institution.city.clone()),
            None => warnings.push(format!(
                "no institution record for {}; stop skipped in route",
                class.institution_id
            )),
        }
    }

    route.push(home_city.to_string());
    (route, warnings)
}

/// Walks the route leg by leg against the matrix, collecting per-leg
/// distances and any missing-pair warnings.
pub fn measure_route(route: &[String], matrix: &DistanceMatrix) -> (Vec<RouteLeg>, f64, Vec<String>) {
    let mut legs = Vec::new();
    let mut total_km = 0.0;
    let mut warnings = Vec::new();

    for pair in route.windows(2) {
        let (km, warning) = matrix.distance(&pair[0], &pair[1]);
        if let Some(warning) = warning {
            warnings.push(warning);
        }
        total_km += km;
        legs.push(RouteLeg {
            from: pair[0].clone(),
            to: pair[1].clone(),
            km,
        });
    }

    (legs, total_km, warnings)
}
