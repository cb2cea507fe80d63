// Static track geometry: an ordered loop of straights and corners.

/// One segment of the circuit. Corners carry the speed the driver model
/// aims for and the radius used for steering and lateral-G estimates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SegmentKind {
    Straight,
    Corner {
        target_speed_kmh: f64,
        radius_m: f64,
    },
}

#[derive(Clone, Copy, Debug)]
pub struct TrackSegment {
    pub kind: SegmentKind,
    pub length_m: f64,
}

impl TrackSegment {
    pub fn straight(length_m: f64) -> Self {
        debug_assert!(length_m > 0.0);
        Self {
            kind: SegmentKind::Straight,
            length_m,
        }
    }

    pub fn corner(length_m: f64, target_speed_kmh: f64, radius_m: f64) -> Self {
        debug_assert!(length_m > 0.0 && target_speed_kmh > 0.0 && radius_m > 0.0);
        Self {
            kind: SegmentKind::Corner {
                target_speed_kmh,
                radius_m,
            },
            length_m,
        }
    }

    pub fn is_straight(&self) -> bool {
        matches!(self.kind, SegmentKind::Straight)
    }

    /// Corner target speed, if this segment is a corner.
    pub fn target_speed_kmh(&self) -> Option<f64> {
        match self.kind {
            SegmentKind::Corner {
                target_speed_kmh, ..
            } => Some(target_speed_kmh),
            SegmentKind::Straight => None,
        }
    }
}

/// Immutable circuit definition, built once at startup and shared
/// read-only by every tick.
#[derive(Clone, Debug)]
pub struct TrackModel {
    segments: Vec<TrackSegment>,
    total_length_m: f64,
}

impl TrackModel {
    /// Panics if `segments` is empty; the circuit is a startup constant.
    pub fn new(segments: Vec<TrackSegment>) -> Self {
        assert!(!segments.is_empty(), "track must have at least one segment");
        let total_length_m = segments.iter().map(|seg| seg.length_m).sum();
        Self {
            segments,
            total_length_m,
        }
    }

    pub fn total_length_m(&self) -> f64 {
        self.total_length_m
    }

    pub fn segments(&self) -> &[TrackSegment] {
        &self.segments
    }

    /// Locates the segment containing `distance`. Callers normalize
    /// `distance` into `[0, total_length)` first; anything past the end
    /// resolves to the last segment.
    pub fn segment_at(&self, distance_m: f64) -> (usize, &TrackSegment, f64) {
        let mut accumulated = 0.0;
        for (index, segment) in self.segments.iter().enumerate() {
            if distance_m < accumulated + segment.length_m {
                return (index, segment, distance_m - accumulated);
            }
            accumulated += segment.length_m;
        }
        let last = self.segments.len() - 1;
        let segment = &self.segments[last];
        (last, segment, segment.length_m)
    }

    /// Segment following `index`, wrapping at the end of the lap.
    pub fn next_segment(&self, index: usize) -> &TrackSegment {
        &self.segments[(index + 1) % self.segments.len()]
    }

    /// The demo circuit: a 3550 m loop with a main straight and a hairpin.
    pub fn demo_circuit() -> Self {
        Self::new(vec![
            TrackSegment::straight(800.0),
            TrackSegment::corner(200.0, 120.0, 50.0),
            TrackSegment::straight(400.0),
            TrackSegment::corner(150.0, 90.0, 30.0),
            TrackSegment::straight(600.0),
            TrackSegment::corner(300.0, 160.0, 100.0),
            TrackSegment::straight(1000.0),
            TrackSegment::corner(100.0, 60.0, 20.0),
        ])
    }
}
