use crate::shared::region::Region;

use super::math::{label_components, union};

/// Relative tolerance used when clustering raw detection windows.
pub const GROUP_EPS: f64 = 0.2;

/// True if two windows describe the same object: every edge of one lies
/// within `eps` × (mean of the smaller sides) of the other's.
pub fn is_similar(a: &Region, b: &Region, eps: f64) -> bool {
    let delta = eps * (a.width.min(b.width) + a.height.min(b.height)) as f64 * 0.5;
    (a.x - b.x).abs() as f64 <= delta
        && (a.y - b.y).abs() as f64 <= delta
        && (a.right() - b.right()).abs() as f64 <= delta
        && (a.bottom() - b.bottom()).abs() as f64 <= delta
}

/// Collapses raw sliding-window hits into detections.
///
/// Windows are clustered with [`is_similar`], each cluster is averaged, and
/// a cluster survives only if it has more than `min_neighbors` members and
/// is not a small box nested inside a stronger surviving cluster. With
/// `min_neighbors == 0` the raw windows are returned unchanged.
///
/// Output follows the order in which clusters first appear in `rects`.
pub fn group_rectangles(rects: &[Region], min_neighbors: u32, eps: f64) -> Vec<Region> {
    if min_neighbors == 0 || rects.is_empty() {
        return rects.to_vec();
    }

    let mut parent: Vec<usize> = (0..rects.len()).collect();
    for i in 0..rects.len() {
        for j in (i + 1)..rects.len() {
            if is_similar(&rects[i], &rects[j], eps) {
                union(&mut parent, i, j);
            }
        }
    }
    let (labels, num_classes) = label_components(&mut parent);

    let mut sums = vec![[0i64; 4]; num_classes];
    let mut counts = vec![0u32; num_classes];
    for (r, &label) in rects.iter().zip(&labels) {
        let s = &mut sums[label];
        s[0] += r.x as i64;
        s[1] += r.y as i64;
        s[2] += r.width as i64;
        s[3] += r.height as i64;
        counts[label] += 1;
    }

    let averaged: Vec<Region> = sums
        .iter()
        .zip(&counts)
        .map(|(s, &n)| {
            let avg = |v: i64| (v as f64 / n as f64).round() as i32;
            Region::new(avg(s[0]), avg(s[1]), avg(s[2]), avg(s[3]))
        })
        .collect();

    let mut kept = Vec::new();
    for (i, r1) in averaged.iter().enumerate() {
        let n1 = counts[i];
        if n1 <= min_neighbors {
            continue;
        }
        let nested = averaged.iter().enumerate().any(|(j, r2)| {
            let n2 = counts[j];
            if j == i || n2 <= min_neighbors {
                return false;
            }
            let dx = (r2.width as f64 * eps).round() as i32;
            let dy = (r2.height as f64 * eps).round() as i32;
            r1.x >= r2.x - dx
                && r1.y >= r2.y - dy
                && r1.right() <= r2.right() + dx
                && r1.bottom() <= r2.bottom() + dy
                && (n2 > n1.max(3) || n1 < 3)
        });
        if !nested {
            kept.push(*r1);
        }
    }
    kept
}
