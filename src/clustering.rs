//! # Cluster Analysis
//!
//! Proposes new landmarks from the rolling location window.
//!
//! ## Algorithm
//!
//! Single-pass, fixed-radius clustering over an immutable snapshot of the
//! window:
//! 1. Each not-yet-claimed sample, in chronological order, seeds a cluster
//!    and claims every other unclaimed sample within the detection radius of
//!    the seed.
//! 2. Clusters below the noise threshold are dropped.
//! 3. Each survivor's center is the mean of its members.
//! 4. Survivors are ordered largest first (stable, so ties keep seed order).
//! 5. The first survivor whose center is not within the detection radius of a
//!    stored landmark becomes the suggestion.
//!
//! Claims are tracked by index into the window, and neighbor candidates come
//! from an R-tree over the window before the exact haversine check.

use std::sync::Arc;

use geo::{Centroid, MultiPoint, Point};
use log::{debug, info};
use rstar::{RTree, RTreeObject, AABB};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::geo_utils::{haversine_distance, meters_to_degrees};
use crate::proximity::any_within_radius;
use crate::{GpsPoint, Landmark, LandmarkConfig, LandmarkDraft, LandmarkStore};

/// Envelope padding applied to the degree span of the detection radius.
const ENVELOPE_MARGIN: f64 = 1.5;

/// A group of samples that all lie within the detection radius of its seed.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    /// Mean latitude/longitude of the members
    pub center: GpsPoint,
    /// Indices into the analyzed window; the seed first, then chronological
    pub members: Vec<usize>,
}

impl Cluster {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Member samples resolved against the window the cluster came from.
    pub fn member_points<'a>(&'a self, window: &'a [GpsPoint]) -> impl Iterator<Item = GpsPoint> + 'a {
        self.members.iter().map(move |&i| window[i])
    }
}

/// A window sample with its index, for R-tree queries.
#[derive(Debug, Clone, Copy)]
struct IndexedSample {
    idx: usize,
    lat: f64,
    lng: f64,
}

impl RTreeObject for IndexedSample {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.lat, self.lng])
    }
}

fn build_rtree(samples: &[GpsPoint], usable: &[bool]) -> RTree<IndexedSample> {
    let indexed: Vec<IndexedSample> = samples
        .iter()
        .enumerate()
        .filter(|(i, _)| usable[*i])
        .map(|(i, p)| IndexedSample {
            idx: i,
            lat: p.latitude,
            lng: p.longitude,
        })
        .collect();
    RTree::bulk_load(indexed)
}

/// Indices of usable samples that may lie within `radius_m` of `seed`.
///
/// Uses the R-tree when the search box stays inside [-180, 180] longitude,
/// otherwise falls back to every usable index.
fn candidate_neighbors(
    tree: &RTree<IndexedSample>,
    usable: &[bool],
    seed: &GpsPoint,
    radius_m: f64,
) -> Vec<usize> {
    let (lat_deg, _) = meters_to_degrees(radius_m, seed.latitude);
    let lat_span = lat_deg * ENVELOPE_MARGIN;
    // Longitude span is widest at the poleward edge of the box
    let poleward_lat = (seed.latitude.abs() + lat_span).min(90.0);
    let (_, lng_deg) = meters_to_degrees(radius_m, poleward_lat);
    let lng_span = lng_deg * ENVELOPE_MARGIN;

    let min_lng = seed.longitude - lng_span;
    let max_lng = seed.longitude + lng_span;
    if min_lng < -180.0 || max_lng > 180.0 {
        return (0..usable.len()).filter(|&i| usable[i]).collect();
    }

    let envelope = AABB::from_corners(
        [seed.latitude - lat_span, min_lng],
        [seed.latitude + lat_span, max_lng],
    );
    tree.locate_in_envelope_intersecting(&envelope).map(|s| s.idx).collect()
}

/// Shift `lng` by a multiple of 360 so it lies within 180 degrees of `reference`.
fn unwrap_longitude(lng: f64, reference: f64) -> f64 {
    let delta = lng - reference;
    if delta > 180.0 {
        lng - 360.0
    } else if delta < -180.0 {
        lng + 360.0
    } else {
        lng
    }
}

/// Bring a longitude back into [-180, 180].
fn wrap_longitude(lng: f64) -> f64 {
    if lng > 180.0 {
        lng - 360.0
    } else if lng < -180.0 {
        lng + 360.0
    } else {
        lng
    }
}

/// Find clusters in a location window, largest first.
///
/// Invalid samples (non-finite or out of range) are never seeds or members.
/// Returns only clusters with at least `config.min_cluster_size` members.
pub fn find_location_clusters(samples: &[GpsPoint], config: &LandmarkConfig) -> Vec<Cluster> {
    let radius_m = config.detection_radius_m;
    let min_size = config.min_cluster_size.max(1) as usize;

    let usable: Vec<bool> = samples.iter().map(GpsPoint::is_valid).collect();
    let tree = build_rtree(samples, &usable);
    let mut claimed = vec![false; samples.len()];
    let mut clusters = Vec::new();

    for seed_idx in 0..samples.len() {
        if claimed[seed_idx] || !usable[seed_idx] {
            continue;
        }
        claimed[seed_idx] = true;
        let seed = samples[seed_idx];

        let mut neighbors: Vec<usize> = candidate_neighbors(&tree, &usable, &seed, radius_m)
            .into_iter()
            .filter(|&j| !claimed[j] && haversine_distance(&seed, &samples[j]) <= radius_m)
            .collect();
        neighbors.sort_unstable();

        let mut members = Vec::with_capacity(neighbors.len() + 1);
        members.push(seed_idx);
        for j in neighbors {
            claimed[j] = true;
            members.push(j);
        }

        if members.len() < min_size {
            continue;
        }

        // Longitudes are unwrapped around the seed so members straddling
        // the antimeridian average to a point next to them
        let multi: MultiPoint<f64> = members
            .iter()
            .map(|&i| {
                let lng = unwrap_longitude(samples[i].longitude, seed.longitude);
                Point::new(lng, samples[i].latitude)
            })
            .collect::<Vec<_>>()
            .into();
        let Some(centroid) = multi.centroid() else {
            continue;
        };

        clusters.push(Cluster {
            center: GpsPoint::new(centroid.y(), wrap_longitude(centroid.x())),
            members,
        });
    }

    // Stable sort keeps seed order among equally sized clusters
    clusters.sort_by(|a, b| b.len().cmp(&a.len()));
    clusters
}

/// First cluster (in the given order) whose center is clear of every landmark.
fn first_unmarked<'a>(
    clusters: &'a [Cluster],
    landmarks: &[Landmark],
    radius_m: f64,
) -> Option<&'a Cluster> {
    #[cfg(feature = "parallel")]
    let near: Vec<bool> = clusters
        .par_iter()
        .map(|c| any_within_radius(landmarks, &c.center, radius_m))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let near: Vec<bool> = clusters
        .iter()
        .map(|c| any_within_radius(landmarks, &c.center, radius_m))
        .collect();

    clusters
        .iter()
        .zip(near)
        .find(|(_, is_near)| !*is_near)
        .map(|(c, _)| c)
}

/// Discovers candidate landmarks from movement history.
pub struct ClusterAnalyzer {
    store: Arc<LandmarkStore>,
    config: LandmarkConfig,
}

impl ClusterAnalyzer {
    pub fn new(store: Arc<LandmarkStore>, config: LandmarkConfig) -> Self {
        Self { store, config }
    }

    pub fn set_config(&mut self, config: LandmarkConfig) {
        self.config = config;
    }

    /// Suggest a new landmark from `history`, oldest sample first.
    ///
    /// Returns `None` if the window is shorter than the configured minimum, no
    /// cluster survives the noise threshold, or every surviving cluster is
    /// already covered by a stored landmark. The suggestion carries no id, its
    /// visit count is the cluster size and `suggested` is set.
    pub fn detect_potential_landmark(&self, history: &[GpsPoint]) -> Option<LandmarkDraft> {
        if history.len() < self.config.min_history_samples as usize {
            debug!(
                "[ClusterAnalyzer] {} samples, {} required",
                history.len(),
                self.config.min_history_samples
            );
            return None;
        }

        let clusters = find_location_clusters(history, &self.config);
        if clusters.is_empty() {
            debug!("[ClusterAnalyzer] No clusters in {} samples", history.len());
            return None;
        }

        let snapshot = self.store.snapshot();
        if snapshot.is_degraded() {
            debug!("[ClusterAnalyzer] Store degraded, duplicate check sees no landmarks");
        }

        let cluster = first_unmarked(&clusters, &snapshot.landmarks, self.config.detection_radius_m)?;
        info!(
            "[ClusterAnalyzer] Suggesting landmark at ({:.6}, {:.6}) from {} samples",
            cluster.center.latitude,
            cluster.center.longitude,
            cluster.len()
        );

        Some(LandmarkDraft {
            id: None,
            name: String::new(),
            description: String::new(),
            latitude: cluster.center.latitude,
            longitude: cluster.center.longitude,
            visit_count: Some(cluster.len() as u32),
            suggested: true,
        })
    }
}
