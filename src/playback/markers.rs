use crate::model::LocationSample;

/// Indices of the markers shown while a replay is not actively playing.
///
/// Keeps the first and last sample plus the first sample of every new
/// calendar day (by device date), in ascending order.
pub fn thinned_indices(samples: &[LocationSample]) -> Vec<usize> {
    let Some(last) = samples.len().checked_sub(1) else {
        return Vec::new();
    };

    let mut indices = vec![0];
    for i in 1..=last {
        let day_changed = samples[i].captured_on() != samples[i - 1].captured_on();
        if day_changed || i == last {
            indices.push(i);
        }
    }
    indices
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::parse_captured_at;

    fn at(captured: &[&str]) -> Vec<LocationSample> {
        captured
            .iter()
            .enumerate()
            .map(|(i, ts)| LocationSample {
                entity_id: "e".into(),
                latitude: i as f64,
                longitude: 0.0,
                captured_at: parse_captured_at(ts).unwrap(),
                battery_percent: None,
                connectivity_type: None,
                connectivity_status: None,
                accuracy: None,
                distance_from_previous_km: None,
            })
            .collect()
    }

    #[test]
    fn two_days_keep_bounds_and_first_of_new_day() {
        let samples = at(&[
            "08:00:00 2024-03-01",
            "12:00:00 2024-03-01",
            "23:59:59 2024-03-01",
            "00:00:10 2024-03-02",
            "07:30:00 2024-03-02",
        ]);
        // Index 2 is the last of the first day, not a boundary.
        assert_eq!(thinned_indices(&samples), vec![0, 3, 4]);
    }

    #[test]
    fn single_day_keeps_only_ends() {
        let samples = at(&[
            "08:00:00 2024-03-01",
            "09:00:00 2024-03-01",
            "10:00:00 2024-03-01",
            "11:00:00 2024-03-01",
        ]);
        assert_eq!(thinned_indices(&samples), vec![0, 3]);
    }

    #[test]
    fn day_change_on_last_index_is_not_duplicated() {
        let samples = at(&["08:00:00 2024-03-01", "08:00:00 2024-03-02"]);
        assert_eq!(thinned_indices(&samples), vec![0, 1]);
    }

    #[test]
    fn every_sample_on_its_own_day() {
        let samples = at(&[
            "08:00:00 2024-03-01",
            "08:00:00 2024-03-02",
            "08:00:00 2024-03-03",
        ]);
        assert_eq!(thinned_indices(&samples), vec![0, 1, 2]);
    }

    #[test]
    fn short_sequences() {
        assert!(thinned_indices(&[]).is_empty());
        assert_eq!(thinned_indices(&at(&["08:00:00 2024-03-01"])), vec![0]);
    }
}
