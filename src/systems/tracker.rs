use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{geometry_utils::distance_points, tracking::TrackedPoint2D, Point2D};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrackerConfigError {
    #[error("health range is empty: min {min} must be below max {max}")]
    EmptyHealthRange { min: i32, max: i32 },
    #[error("start health {start} must be above min {min} and no higher than max {max}")]
    StartOutOfRange { start: i32, min: i32, max: i32 },
    #[error("gain on match must be positive, got {0}")]
    NonPositiveGain(i32),
    #[error("decay on miss must be positive, got {0}")]
    NonPositiveDecay(i32),
    #[error("match radius must be a positive finite distance, got {0}")]
    InvalidMatchRadius(f32),
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct TrackerSettings {
    pub health_max: i32,
    pub health_min: i32,
    pub health_start: i32,
    /// Health added when a raw detection is matched to the track
    pub gain_on_match: i32,
    /// Health removed on every update where the track is not matched
    pub decay_on_miss: i32,
    /// How close (in frame pixels) a raw detection must be to count as the same point
    pub match_radius: f32,
}

impl TrackerSettings {
    pub fn validate(&self) -> Result<(), TrackerConfigError> {
        let TrackerSettings {
            health_max,
            health_min,
            health_start,
            gain_on_match,
            decay_on_miss,
            match_radius,
        } = *self;
        if health_min >= health_max {
            return Err(TrackerConfigError::EmptyHealthRange {
                min: health_min,
                max: health_max,
            });
        }
        if health_start <= health_min || health_start > health_max {
            return Err(TrackerConfigError::StartOutOfRange {
                start: health_start,
                min: health_min,
                max: health_max,
            });
        }
        if gain_on_match <= 0 {
            return Err(TrackerConfigError::NonPositiveGain(gain_on_match));
        }
        if decay_on_miss <= 0 {
            return Err(TrackerConfigError::NonPositiveDecay(decay_on_miss));
        }
        if !(match_radius.is_finite() && match_radius > 0.) {
            return Err(TrackerConfigError::InvalidMatchRadius(match_radius));
        }
        Ok(())
    }
}

impl Default for TrackerSettings {
    fn default() -> Self {
        TrackerSettings {
            health_max: 50,
            health_min: 0,
            health_start: 25,
            gain_on_match: 3,
            decay_on_miss: 1,
            match_radius: 50.,
        }
    }
}

#[derive(Debug, Clone)]
struct TrackedPoint {
    position: Point2D,
    health: i32,
}

impl TrackedPoint {
    fn matched(&mut self, position: Point2D, settings: &TrackerSettings) {
        self.position = position;
        self.health = self
            .health
            .saturating_add(settings.gain_on_match)
            .clamp(settings.health_min, settings.health_max);
    }

    fn missed(&mut self, settings: &TrackerSettings) {
        self.health = self
            .health
            .saturating_sub(settings.decay_on_miss)
            .clamp(settings.health_min, settings.health_max);
    }

    fn is_dead(&self, settings: &TrackerSettings) -> bool {
        self.health <= settings.health_min
    }
}

/// Keeps a set of tracked points alive across frames, matching each frame's raw
/// detections to known points by nearest neighbour within `match_radius`.
///
/// Tracks are held in insertion order (oldest first); matching, eviction and the
/// returned positions all follow that order, so results are reproducible.
pub struct Tracker {
    settings: TrackerSettings,
    known_points: IndexMap<usize, TrackedPoint>,
    next_id: usize,
}

impl Tracker {
    pub fn new(settings: TrackerSettings) -> Result<Self, TrackerConfigError> {
        settings.validate()?;
        Ok(Tracker {
            settings,
            known_points: IndexMap::new(),
            next_id: 0,
        })
    }

    /// Ingest the raw detections of one frame and return the stabilised positions
    /// of all live points.
    ///
    /// Coordinates are assumed finite; filter before calling.
    pub fn update(&mut self, raw_detections: &[Point2D]) -> Vec<Point2D> {
        let settings = &self.settings;
        // Unclaimed detections, kept in input order so ties go to the first one
        let mut pool: Vec<Point2D> = raw_detections.to_vec();

        for (id, tp) in self.known_points.iter_mut() {
            let closest = pool
                .iter()
                .enumerate()
                .map(|(i, p)| (i, distance_points(p, &tp.position)))
                .fold(None, |best: Option<(usize, f32)>, (i, d)| match best {
                    Some((_, best_d)) if best_d <= d => best,
                    _ => Some((i, d)),
                });

            match closest {
                Some((i, d)) if d <= settings.match_radius => {
                    let claimed = pool.remove(i);
                    tp.matched(claimed, settings);
                }
                _ => {
                    tp.missed(settings);
                    if tp.is_dead(settings) {
                        debug!("Point #{} at {:?} ran out of health", id, tp.position);
                    }
                }
            }
        }

        self.known_points.retain(|_id, tp| !tp.is_dead(settings));

        for p in pool {
            let id = self.next_id;
            self.next_id += 1;
            debug!("Added new, unknown point #{} at {:?}", id, p);
            self.known_points.insert(
                id,
                TrackedPoint {
                    position: p,
                    health: settings.health_start,
                },
            );
        }

        self.positions()
    }

    pub fn positions(&self) -> Vec<Point2D> {
        self.known_points.values().map(|tp| tp.position).collect()
    }

    pub fn tracked_points(&self) -> Vec<TrackedPoint2D> {
        self.known_points
            .iter()
            .map(|(id, tp)| TrackedPoint2D::new(*id, tp.position, tp.health))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.known_points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known_points.is_empty()
    }

    pub fn clear(&mut self) {
        self.known_points.clear();
    }

    pub fn settings(&self) -> &TrackerSettings {
        &self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_settings() -> TrackerSettings {
        TrackerSettings {
            health_max: 50,
            health_min: 0,
            health_start: 25,
            gain_on_match: 3,
            decay_on_miss: 1,
            match_radius: 50.,
        }
    }

    fn healths(tracker: &Tracker) -> Vec<i32> {
        tracker.tracked_points().iter().map(|p| p.health).collect()
    }

    #[test]
    fn new_point_starts_at_start_health() {
        let mut tracker = Tracker::new(scenario_settings()).unwrap();
        assert_eq!(tracker.update(&[(10., 10.)]), vec![(10., 10.)]);
        assert_eq!(healths(&tracker), vec![25]);
    }

    #[test]
    fn matched_point_follows_detection_then_expires() {
        let mut tracker = Tracker::new(scenario_settings()).unwrap();
        tracker.update(&[(10., 10.)]);
        assert_eq!(tracker.update(&[(12., 11.)]), vec![(12., 11.)]);
        assert_eq!(healths(&tracker), vec![28]);

        for i in 1..28 {
            assert_eq!(tracker.update(&[]), vec![(12., 11.)]);
            assert_eq!(healths(&tracker), vec![28 - i]);
        }
        // 28th miss takes health from 1 to the minimum
        assert!(tracker.update(&[]).is_empty());
        assert!(tracker.is_empty());
    }

    #[test]
    fn nearest_track_claims_detection() {
        let settings = TrackerSettings {
            match_radius: 60.,
            ..scenario_settings()
        };
        let mut tracker = Tracker::new(settings).unwrap();
        tracker.update(&[(0., 0.), (100., 100.)]);

        let out = tracker.update(&[(40., 40.)]);
        assert_eq!(out, vec![(40., 40.), (100., 100.)]);
        assert_eq!(healths(&tracker), vec![28, 24]);
        assert_eq!(tracker.len(), 2);
    }

    #[test]
    fn detection_outside_radius_spawns_new_track() {
        let mut tracker = Tracker::new(scenario_settings()).unwrap();
        tracker.update(&[(0., 0.)]);
        let out = tracker.update(&[(60., 0.)]);
        assert_eq!(out, vec![(0., 0.), (60., 0.)]);
        assert_eq!(healths(&tracker), vec![24, 25]);
    }

    #[test]
    fn boundary_distance_is_a_match() {
        let mut tracker = Tracker::new(scenario_settings()).unwrap();
        tracker.update(&[(0., 0.)]);
        assert_eq!(tracker.update(&[(30., 40.)]), vec![(30., 40.)]);
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn detection_claimed_at_most_once() {
        let mut tracker = Tracker::new(scenario_settings()).unwrap();
        tracker.update(&[(0., 0.), (10., 0.)]);
        // Both tracks are within range of the single detection; only the
        // oldest one may take it
        let out = tracker.update(&[(5., 0.)]);
        assert_eq!(out, vec![(5., 0.), (10., 0.)]);
        assert_eq!(healths(&tracker), vec![28, 24]);
    }

    #[test]
    fn equal_distance_tie_goes_to_first_detection() {
        let mut tracker = Tracker::new(scenario_settings()).unwrap();
        tracker.update(&[(0., 0.)]);
        let out = tracker.update(&[(-10., 0.), (10., 0.)]);
        assert_eq!(out, vec![(-10., 0.), (10., 0.)]);
        let ids: Vec<usize> = tracker.tracked_points().iter().map(|p| p.id()).collect();
        assert_eq!(ids, vec![0, 1]);
    }

    #[test]
    fn duplicate_detections_spawn_second_track() {
        let mut tracker = Tracker::new(scenario_settings()).unwrap();
        tracker.update(&[(5., 5.)]);
        let out = tracker.update(&[(5., 5.), (5., 5.)]);
        assert_eq!(out, vec![(5., 5.), (5., 5.)]);
        assert_eq!(healths(&tracker), vec![28, 25]);
    }

    #[test]
    fn every_unclaimed_detection_creates_one_track() {
        let mut tracker = Tracker::new(scenario_settings()).unwrap();
        let detections = [(0., 0.), (200., 0.), (400., 0.), (600., 0.)];
        assert_eq!(tracker.update(&detections), detections.to_vec());
        assert_eq!(healths(&tracker), vec![25; 4]);
    }

    #[test]
    fn no_tracks_and_no_detections_is_a_no_op() {
        let mut tracker = Tracker::new(scenario_settings()).unwrap();
        assert!(tracker.update(&[]).is_empty());
        assert!(tracker.is_empty());
    }

    #[test]
    fn health_never_exceeds_max() {
        let mut tracker = Tracker::new(scenario_settings()).unwrap();
        for _ in 0..100 {
            tracker.update(&[(1., 1.)]);
            let h = healths(&tracker);
            assert!(h.iter().all(|h| (0..=50).contains(h)));
        }
        assert_eq!(healths(&tracker), vec![50]);
    }

    #[test]
    fn clamping_holds_for_mixed_sequences() {
        let settings = TrackerSettings {
            health_max: 10,
            health_min: 2,
            health_start: 4,
            gain_on_match: 7,
            decay_on_miss: 5,
            match_radius: 20.,
        };
        let mut tracker = Tracker::new(settings).unwrap();
        let frames: Vec<Vec<Point2D>> = vec![
            vec![(0., 0.), (100., 100.)],
            vec![(1., 1.)],
            vec![(2., 2.), (100., 100.), (300., 300.)],
            vec![],
            vec![(3., 3.)],
            vec![],
            vec![],
        ];
        for frame in frames.iter() {
            tracker.update(frame);
            for p in tracker.tracked_points() {
                assert!(p.health > 2 && p.health <= 10, "health {}", p.health);
            }
        }
    }

    #[test]
    fn empty_updates_evict_fresh_tracks() {
        let settings = TrackerSettings {
            health_start: 10,
            decay_on_miss: 3,
            ..scenario_settings()
        };
        let mut tracker = Tracker::new(settings).unwrap();
        tracker.update(&[(0., 0.), (500., 500.)]);

        // ceil(10 / 3) == 4
        for _ in 0..3 {
            assert_eq!(tracker.update(&[]).len(), 2);
        }
        assert!(tracker.update(&[]).is_empty());
        assert!(tracker.is_empty());
        assert!(tracker.update(&[]).is_empty());
    }

    #[test]
    fn evicted_track_is_never_resurrected() {
        let settings = TrackerSettings {
            health_start: 1,
            ..scenario_settings()
        };
        let mut tracker = Tracker::new(settings).unwrap();
        tracker.update(&[(10., 10.)]);
        assert!(tracker.update(&[]).is_empty());

        tracker.update(&[(10., 10.)]);
        let points = tracker.tracked_points();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].id(), 1);
        assert_eq!(points[0].health, 1);
    }

    #[test]
    fn missed_track_holds_position() {
        let mut tracker = Tracker::new(scenario_settings()).unwrap();
        tracker.update(&[(10., 10.)]);
        tracker.update(&[(400., 400.)]);
        let points = tracker.tracked_points();
        assert_eq!(points[0].position(), (10., 10.));
        assert_eq!(points[0].health, 24);
    }

    #[test]
    fn clear_drops_all_tracks() {
        let mut tracker = Tracker::new(scenario_settings()).unwrap();
        tracker.update(&[(1., 1.), (300., 1.)]);
        tracker.clear();
        assert!(tracker.is_empty());
        assert!(tracker.positions().is_empty());
    }

    #[test]
    fn rejects_malformed_settings() {
        let base = scenario_settings();
        assert!(matches!(
            Tracker::new(TrackerSettings {
                health_min: 50,
                ..base
            }),
            Err(TrackerConfigError::EmptyHealthRange { .. })
        ));
        assert!(matches!(
            Tracker::new(TrackerSettings {
                health_start: 0,
                ..base
            }),
            Err(TrackerConfigError::StartOutOfRange { .. })
        ));
        assert!(matches!(
            Tracker::new(TrackerSettings {
                health_start: 51,
                ..base
            }),
            Err(TrackerConfigError::StartOutOfRange { .. })
        ));
        assert_eq!(
            Tracker::new(TrackerSettings {
                gain_on_match: 0,
                ..base
            })
            .err(),
            Some(TrackerConfigError::NonPositiveGain(0))
        );
        assert_eq!(
            Tracker::new(TrackerSettings {
                decay_on_miss: -1,
                ..base
            })
            .err(),
            Some(TrackerConfigError::NonPositiveDecay(-1))
        );
        assert!(matches!(
            Tracker::new(TrackerSettings {
                match_radius: f32::NAN,
                ..base
            }),
            Err(TrackerConfigError::InvalidMatchRadius(_))
        ));
        assert!(Tracker::new(TrackerSettings::default()).is_ok());
    }
}
