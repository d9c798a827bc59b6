use aidcore::guidance::LivePositions;
use aidcore::prelude::{ImageSize, PixelPoint};
use aidcore::targeting::PlacementTarget;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::f32::consts::PI;

/// Synthetic hand/finger tracker. Starts `start_offset_px` away from the first
/// target and closes a fixed fraction of the gap every frame, with jitter.
pub struct HandSimulator {
    rng: StdRng,
    offset: Option<(f32, f32)>,
    start_offset_px: f32,
    approach: f32,
    jitter_px: f32,
    two_handed: bool,
}

impl HandSimulator {
    pub fn new(seed: u64, start_offset_px: f32, approach: f32, jitter_px: f32) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            offset: None,
            start_offset_px,
            approach: approach.clamp(0.0, 1.0),
            jitter_px: jitter_px.abs(),
            two_handed: false,
        }
    }

    /// Also report a second hand resting just beside the first.
    pub fn two_handed(mut self) -> Self {
        self.two_handed = true;
        self
    }

    fn jitter(&mut self) -> f32 {
        if self.jitter_px > 0.0 {
            self.rng.gen_range(-self.jitter_px..self.jitter_px)
        } else {
            0.0
        }
    }

    pub fn next_frame(&mut self, target: Option<&PlacementTarget>, image: ImageSize) -> LivePositions {
        let Some(target) = target else {
            return LivePositions::default();
        };

        let (dx, dy) = match self.offset {
            Some((dx, dy)) => (dx * (1.0 - self.approach), dy * (1.0 - self.approach)),
            None => {
                let angle = self.rng.gen_range(0.0..(2.0 * PI));
                (
                    angle.cos() * self.start_offset_px,
                    angle.sin() * self.start_offset_px,
                )
            }
        };
        self.offset = Some((dx, dy));

        let anchor = PixelPoint::new(target.x * image.width, target.y * image.height);
        let primary = PixelPoint::new(
            (anchor.x + dx + self.jitter()).clamp(0.0, image.width),
            (anchor.y + dy + self.jitter()).clamp(0.0, image.height),
        );
        let secondary = self.two_handed.then(|| {
            PixelPoint::new(
                (primary.x + 25.0 + self.jitter()).clamp(0.0, image.width),
                primary.y,
            )
        });

        LivePositions {
            primary: Some(primary),
            secondary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IMAGE: ImageSize = ImageSize {
        width: 400.0,
        height: 800.0,
    };

    #[test]
    fn no_target_means_no_positions() {
        let mut hands = HandSimulator::new(1, 100.0, 0.5, 0.0);
        assert_eq!(hands.next_frame(None, IMAGE), LivePositions::default());
    }

    #[test]
    fn hand_converges_on_target() {
        let target = PlacementTarget::new(0.5, 0.5, 1.0, None);
        let mut hands = HandSimulator::new(3, 120.0, 0.5, 0.0);
        let anchor = PixelPoint::new(200.0, 400.0);

        let first = hands.next_frame(Some(&target), IMAGE).primary.unwrap();
        assert!((first.distance_to(&anchor) - 120.0).abs() < 1e-3);
        let second = hands.next_frame(Some(&target), IMAGE).primary.unwrap();
        assert!((second.distance_to(&anchor) - 60.0).abs() < 1e-3);
    }

    #[test]
    fn same_seed_replays_same_path() {
        let target = PlacementTarget::new(0.3, 0.6, 1.0, None);
        let mut a = HandSimulator::new(42, 80.0, 0.3, 5.0).two_handed();
        let mut b = HandSimulator::new(42, 80.0, 0.3, 5.0).two_handed();
        for _ in 0..4 {
            let frame = a.next_frame(Some(&target), IMAGE);
            assert_eq!(frame, b.next_frame(Some(&target), IMAGE));
            assert!(frame.secondary.is_some());
        }
    }
}
