//! Time-valued properties: keyframes and their interpolation.
//!
//! Every animatable clip property is stored as a base value plus an optional
//! list of keyframes. At render time the list is sampled with [`interpolate`]:
//!
//! - no keyframes: the base value
//! - before the first / after the last keyframe: that keyframe's value (clamped)
//! - between two numeric or vector keyframes: linear interpolation
//! - between two discrete keyframes: the earlier value (step)

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::geometry::Vec2;

/// Keyframes closer than this many seconds share a timestamp.
pub const KEYFRAME_EPSILON: f64 = 0.001;

/// Value carried by a keyframe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyframeValue {
    /// Scalar property (rotation, opacity).
    Scalar(f64),
    /// 2D property (position, scale).
    Vector(Vec2),
    /// Non-interpolable value; held until the next keyframe.
    Discrete(String),
}

impl KeyframeValue {
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Self::Scalar(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_vec2(&self) -> Option<Vec2> {
        match self {
            Self::Vector(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<f64> for KeyframeValue {
    fn from(v: f64) -> Self {
        Self::Scalar(v)
    }
}

impl From<Vec2> for KeyframeValue {
    fn from(v: Vec2) -> Self {
        Self::Vector(v)
    }
}

/// A `(time, value)` sample of an animated property. `time` is on the
/// project timeline, in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub time: f64,
    pub value: KeyframeValue,
}

impl Keyframe {
    pub fn new(time: f64, value: impl Into<KeyframeValue>) -> Self {
        Self {
            time,
            value: value.into(),
        }
    }
}

/// Clip properties that can carry keyframes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimatedProperty {
    Position,
    Scale,
    Rotation,
    Opacity,
}

impl AnimatedProperty {
    pub const ALL: [AnimatedProperty; 4] = [
        AnimatedProperty::Position,
        AnimatedProperty::Scale,
        AnimatedProperty::Rotation,
        AnimatedProperty::Opacity,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Position => "position",
            Self::Scale => "scale",
            Self::Rotation => "rotation",
            Self::Opacity => "opacity",
        }
    }
}

impl std::str::FromStr for AnimatedProperty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "position" => Ok(Self::Position),
            "scale" => Ok(Self::Scale),
            "rotation" => Ok(Self::Rotation),
            "opacity" => Ok(Self::Opacity),
            other => Err(format!("unknown property: {other}")),
        }
    }
}

/// Keyframe lists per property, each sorted ascending by time.
pub type KeyframeMap = BTreeMap<AnimatedProperty, Vec<Keyframe>>;

/// Sample a keyframe list at `time`.
///
/// Tolerates unsorted input by sorting a copy and skips keyframes whose time
/// is not finite. A NaN `time` samples the first keyframe.
pub fn interpolate(keyframes: &[Keyframe], time: f64, fallback: &KeyframeValue) -> KeyframeValue {
    let sorted: Cow<'_, [Keyframe]> = if is_sorted(keyframes) {
        Cow::Borrowed(keyframes)
    } else {
        let mut owned: Vec<Keyframe> = keyframes
            .iter()
            .filter(|kf| kf.time.is_finite())
            .cloned()
            .collect();
        owned.sort_by(|a, b| a.time.total_cmp(&b.time));
        Cow::Owned(owned)
    };
    if sorted.is_empty() {
        return fallback.clone();
    }

    let first = &sorted[0];
    let last = &sorted[sorted.len() - 1];

    if time.is_nan() || time <= first.time {
        return first.value.clone();
    }
    if time >= last.time {
        return last.value.clone();
    }

    // first.time < time < last.time, so the index lies in 1..len
    let next_idx = sorted.partition_point(|kf| kf.time <= time);
    let prev = &sorted[next_idx - 1];
    let next = &sorted[next_idx];

    let span = next.time - prev.time;
    if !(span > 0.0) || !span.is_finite() {
        return prev.value.clone();
    }
    let factor = (time - prev.time) / span;

    match (&prev.value, &next.value) {
        (KeyframeValue::Scalar(a), KeyframeValue::Scalar(b)) => {
            KeyframeValue::Scalar(a + (b - a) * factor)
        }
        (KeyframeValue::Vector(a), KeyframeValue::Vector(b)) => {
            KeyframeValue::Vector(Vec2::lerp(a, b, factor))
        }
        _ => prev.value.clone(),
    }
}

/// Sample a scalar property. Mismatched or non-finite samples yield `base`.
pub fn interpolate_scalar(keyframes: Option<&Vec<Keyframe>>, time: f64, base: f64) -> f64 {
    let Some(keyframes) = keyframes else {
        return base;
    };
    match interpolate(keyframes, time, &KeyframeValue::Scalar(base)) {
        KeyframeValue::Scalar(v) if v.is_finite() => v,
        _ => base,
    }
}

/// Sample a vector property. Mismatched or non-finite samples yield `base`.
pub fn interpolate_vec2(keyframes: Option<&Vec<Keyframe>>, time: f64, base: Vec2) -> Vec2 {
    let Some(keyframes) = keyframes else {
        return base;
    };
    match interpolate(keyframes, time, &KeyframeValue::Vector(base)) {
        KeyframeValue::Vector(v) if v.is_finite() => v,
        _ => base,
    }
}

/// Return a new list with `keyframe` inserted, replacing any keyframe within
/// `epsilon` seconds of it. The result is sorted.
pub fn insert_keyframe(keyframes: &[Keyframe], keyframe: Keyframe, epsilon: f64) -> Vec<Keyframe> {
    let mut updated: Vec<Keyframe> = keyframes
        .iter()
        .filter(|kf| (kf.time - keyframe.time).abs() > epsilon)
        .cloned()
        .collect();
    updated.push(keyframe);
    updated.sort_by(|a, b| a.time.total_cmp(&b.time));
    updated
}

/// Return a new list without keyframes within `epsilon` of `time`.
pub fn remove_keyframe_at(keyframes: &[Keyframe], time: f64, epsilon: f64) -> Vec<Keyframe> {
    keyframes
        .iter()
        .filter(|kf| (kf.time - time).abs() > epsilon)
        .cloned()
        .collect()
}

/// Sort and collapse duplicates; later entries win over earlier ones
/// sharing a timestamp.
pub fn normalize_keyframes(keyframes: &[Keyframe], epsilon: f64) -> Vec<Keyframe> {
    keyframes
        .iter()
        .filter(|kf| kf.time.is_finite())
        .fold(Vec::new(), |acc, kf| insert_keyframe(&acc, kf.clone(), epsilon))
}

/// Whether the list is sorted and free of timestamps closer than `epsilon`.
pub fn is_normalized(keyframes: &[Keyframe], epsilon: f64) -> bool {
    keyframes
        .windows(2)
        .all(|pair| pair[1].time - pair[0].time > epsilon)
}

fn is_sorted(keyframes: &[Keyframe]) -> bool {
    keyframes.iter().all(|kf| kf.time.is_finite())
        && keyframes.windows(2).all(|pair| pair[0].time <= pair[1].time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn scalar(v: &KeyframeValue) -> f64 {
        v.as_scalar().expect("scalar value")
    }

    #[test]
    fn test_empty_returns_fallback() {
        let fallback = KeyframeValue::Scalar(7.0);
        assert_eq!(interpolate(&[], 3.0, &fallback), fallback);
        assert_eq!(interpolate_scalar(None, 3.0, 7.0), 7.0);
    }

    #[test]
    fn test_numeric_midpoint() {
        let kfs = vec![Keyframe::new(0.0, 0.0), Keyframe::new(10.0, 100.0)];
        let v = interpolate(&kfs, 5.0, &KeyframeValue::Scalar(0.0));
        assert!((scalar(&v) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_vector_midpoint() {
        let kfs = vec![
            Keyframe::new(0.0, Vec2::new(0.0, 0.0)),
            Keyframe::new(2.0, Vec2::new(4.0, 10.0)),
        ];
        let v = interpolate_vec2(Some(&kfs), 1.0, Vec2::ZERO);
        assert!((v.x - 2.0).abs() < 1e-9);
        assert!((v.y - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_clamps_outside_range() {
        let kfs = vec![Keyframe::new(1.0, 10.0), Keyframe::new(3.0, 30.0)];
        let fallback = KeyframeValue::Scalar(0.0);
        assert_eq!(scalar(&interpolate(&kfs, -100.0, &fallback)), 10.0);
        assert_eq!(scalar(&interpolate(&kfs, 1.0, &fallback)), 10.0);
        assert_eq!(scalar(&interpolate(&kfs, 3.0, &fallback)), 30.0);
        assert_eq!(scalar(&interpolate(&kfs, f64::INFINITY, &fallback)), 30.0);
    }

    #[test]
    fn test_discrete_values_step() {
        let kfs = vec![
            Keyframe::new(0.0, KeyframeValue::Discrete("a".into())),
            Keyframe::new(2.0, KeyframeValue::Discrete("b".into())),
        ];
        let v = interpolate(&kfs, 1.9, &KeyframeValue::Discrete("z".into()));
        assert_eq!(v, KeyframeValue::Discrete("a".into()));
    }

    #[test]
    fn test_mixed_variants_step() {
        let kfs = vec![Keyframe::new(0.0, 1.0), Keyframe::new(2.0, Vec2::ONE)];
        let v = interpolate(&kfs, 1.0, &KeyframeValue::Scalar(0.0));
        assert_eq!(v, KeyframeValue::Scalar(1.0));
        // Typed helper falls back to base on variant mismatch.
        assert_eq!(interpolate_vec2(Some(&kfs), 0.5, Vec2::CENTER), Vec2::CENTER);
    }

    #[test]
    fn test_unsorted_input_is_sorted() {
        let kfs = vec![Keyframe::new(10.0, 100.0), Keyframe::new(0.0, 0.0)];
        let v = interpolate(&kfs, 2.5, &KeyframeValue::Scalar(0.0));
        assert!((scalar(&v) - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_non_finite_times_are_skipped() {
        let kfs = vec![
            Keyframe::new(-f64::NAN, 100.0),
            Keyframe::new(0.0, 0.0),
            Keyframe::new(10.0, 100.0),
        ];
        let fallback = KeyframeValue::Scalar(7.0);
        assert_eq!(interpolate(&kfs, 5.0, &fallback).as_scalar(), Some(50.0));
        assert_eq!(interpolate(&kfs, -1.0, &fallback).as_scalar(), Some(0.0));

        let only_bad = vec![Keyframe::new(f64::NAN, 1.0), Keyframe::new(f64::INFINITY, 2.0)];
        assert_eq!(interpolate(&only_bad, 1.0, &fallback), fallback);
        assert_eq!(interpolate(&only_bad[..1], 1.0, &fallback), fallback);
    }

    #[test]
    fn test_insert_replaces_within_epsilon() {
        let kfs = vec![Keyframe::new(1.0, 1.0), Keyframe::new(2.0, 2.0)];
        let updated = insert_keyframe(&kfs, Keyframe::new(1.0005, 9.0), KEYFRAME_EPSILON);
        assert_eq!(updated.len(), 2);
        assert_eq!(updated[0].value, KeyframeValue::Scalar(9.0));
        assert!(is_normalized(&updated, KEYFRAME_EPSILON));
    }

    #[test]
    fn test_insert_keeps_order() {
        let kfs = vec![Keyframe::new(0.0, 0.0), Keyframe::new(4.0, 4.0)];
        let updated = insert_keyframe(&kfs, Keyframe::new(2.0, 8.0), KEYFRAME_EPSILON);
        let times: Vec<f64> = updated.iter().map(|kf| kf.time).collect();
        assert_eq!(times, vec![0.0, 2.0, 4.0]);
    }

    #[test]
    fn test_degenerate_pair_collapses() {
        let kfs = normalize_keyframes(
            &[Keyframe::new(1.0, 5.0), Keyframe::new(1.0, 7.0)],
            KEYFRAME_EPSILON,
        );
        assert_eq!(kfs.len(), 1);
        assert_eq!(kfs[0].value, KeyframeValue::Scalar(7.0));
        let v = interpolate(&kfs, 1.0, &KeyframeValue::Scalar(0.0));
        assert!(scalar(&v).is_finite());
    }

    #[test]
    fn test_raw_duplicate_times_never_divide_by_zero() {
        let kfs = vec![
            Keyframe::new(0.0, 0.0),
            Keyframe::new(1.0, 5.0),
            Keyframe::new(1.0, 7.0),
            Keyframe::new(2.0, 9.0),
        ];
        for t in [0.5, 1.0, 1.5] {
            let v = interpolate(&kfs, t, &KeyframeValue::Scalar(0.0));
            assert!(scalar(&v).is_finite());
        }
    }

    #[test]
    fn test_remove_keyframe() {
        let kfs = vec![Keyframe::new(0.0, 0.0), Keyframe::new(1.0, 1.0)];
        let updated = remove_keyframe_at(&kfs, 1.0, KEYFRAME_EPSILON);
        assert_eq!(updated.len(), 1);
    }

    #[test]
    fn test_value_serde_shapes() {
        let kfs = vec![
            Keyframe::new(0.0, 1.5),
            Keyframe::new(1.0, Vec2::new(0.25, 0.75)),
            Keyframe::new(2.0, KeyframeValue::Discrete("bold".into())),
        ];
        let json = serde_json::to_string(&kfs).unwrap();
        assert!(json.contains(r#""value":1.5"#));
        assert!(json.contains(r#""value":{"x":0.25,"y":0.75}"#));
        assert!(json.contains(r#""value":"bold""#));
        let parsed: Vec<Keyframe> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, kfs);
    }

    fn keyframe_list() -> impl Strategy<Value = Vec<Keyframe>> {
        prop::collection::vec((-100.0f64..100.0, -1e3f64..1e3), 1..12).prop_map(|pairs| {
            pairs
                .into_iter()
                .map(|(t, v)| Keyframe::new(t, v))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_outside_range_equals_boundary(kfs in keyframe_list(), offset in 0.0f64..1e4) {
            let normalized = normalize_keyframes(&kfs, KEYFRAME_EPSILON);
            let first = normalized.first().unwrap().clone();
            let last = normalized.last().unwrap().clone();
            let fallback = KeyframeValue::Scalar(f64::NAN);

            prop_assert_eq!(interpolate(&normalized, first.time - offset, &fallback), first.value);
            prop_assert_eq!(interpolate(&normalized, last.time + offset, &fallback), last.value);
        }

        #[test]
        fn prop_interior_value_is_bounded(kfs in keyframe_list(), t in -100.0f64..100.0) {
            let normalized = normalize_keyframes(&kfs, KEYFRAME_EPSILON);
            let v = scalar(&interpolate(&normalized, t, &KeyframeValue::Scalar(0.0)));
            let min = normalized.iter().filter_map(|kf| kf.value.as_scalar()).fold(f64::INFINITY, f64::min);
            let max = normalized.iter().filter_map(|kf| kf.value.as_scalar()).fold(f64::NEG_INFINITY, f64::max);
            prop_assert!(v >= min - 1e-9 && v <= max + 1e-9);
        }

        #[test]
        fn prop_unsorted_matches_sorted(kfs in keyframe_list(), t in -100.0f64..100.0) {
            let normalized = normalize_keyframes(&kfs, KEYFRAME_EPSILON);
            let mut reversed = normalized.clone();
            reversed.reverse();
            let fallback = KeyframeValue::Scalar(0.0);
            prop_assert_eq!(interpolate(&reversed, t, &fallback), interpolate(&normalized, t, &fallback));
        }
    }
}
