//! Reference augmentation producing two stochastic views.

use std::sync::{Mutex, PoisonError};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::TransformError;
use crate::image::ChwImage;
use crate::transform::TwoViewTransform;

/// Two-view augmentation: independent horizontal mirroring plus additive
/// pixel jitter per view.
///
/// Each view draws its own flip decision and its own noise, so the two
/// views of one sample differ even though they come from a single call.
/// With a fixed seed the whole stream of draws is reproducible.
///
/// # Example
///
/// ```
/// use pretrain_dataset::{ChwImage, MirrorJitter, TwoViewTransform};
///
/// let augment = MirrorJitter::new(0.5, 2.0, Some(42));
/// let image = ChwImage::new(1, 2, 2, vec![0.0, 10.0, 20.0, 30.0]).unwrap();
/// let (a, b) = augment.two_views(&image).unwrap();
/// assert_eq!(a.shape(), image.shape());
/// assert_eq!(b.shape(), image.shape());
/// ```
#[derive(Debug)]
pub struct MirrorJitter {
    flip_probability: f64,
    jitter: f32,
    rng: Mutex<ChaCha8Rng>,
}

impl MirrorJitter {
    /// Creates a new augmentation.
    ///
    /// # Arguments
    ///
    /// - `flip_probability`: chance of mirroring each view, clamped to
    ///   `[0, 1]`
    /// - `jitter`: maximum absolute additive noise per value; `0` disables
    ///   the jitter
    /// - `seed`: optional seed for reproducible draws
    #[must_use]
    pub fn new(flip_probability: f64, jitter: f32, seed: Option<u64>) -> Self {
        let rng = seed.map_or_else(ChaCha8Rng::from_entropy, ChaCha8Rng::seed_from_u64);
        Self {
            flip_probability: flip_probability.clamp(0.0, 1.0),
            jitter: jitter.max(0.0),
            rng: Mutex::new(rng),
        }
    }

    fn one_view(&self, image: &ChwImage, rng: &mut ChaCha8Rng) -> ChwImage {
        let mut view = image.clone();

        if rng.gen::<f64>() < self.flip_probability {
            mirror_horizontal(&mut view);
        }

        if self.jitter > 0.0 {
            for value in &mut view.data {
                *value += rng.gen_range(-self.jitter..=self.jitter);
            }
        }

        view
    }
}

impl TwoViewTransform for MirrorJitter {
    fn two_views(&self, image: &ChwImage) -> Result<(ChwImage, ChwImage), TransformError> {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let first = self.one_view(image, &mut rng);
        let second = self.one_view(image, &mut rng);
        Ok((first, second))
    }
}

/// Mirrors a CHW image around its vertical center line, in place.
fn mirror_horizontal(image: &mut ChwImage) {
    let (c, h, w) = (
        image.channels as usize,
        image.height as usize,
        image.width as usize,
    );
    for ch in 0..c {
        for row in 0..h {
            let line = ch * h * w + row * w;
            image.data[line..line + w].reverse();
        }
    }
}
