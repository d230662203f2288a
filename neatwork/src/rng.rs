use rand::Rng;

/// A source of coin flips, used whenever a genetic choice
/// between two parents has to be made.
///
/// Implemented for every `FnMut() -> bool`, so a fixed
/// source can be injected where reproducible offspring are
/// needed:
/// ```
/// use neatwork::Coin;
///
/// let mut always_heads = || true;
/// assert!(always_heads.flip());
/// ```
pub trait Coin {
    /// Returns the result of a single flip.
    fn flip(&mut self) -> bool;
}

impl<F> Coin for F
where
    F: FnMut() -> bool,
{
    fn flip(&mut self) -> bool {
        self()
    }
}

/// Simple wrapper for a borrowed `R: Rng`, flipping a
/// coin that comes up `true` with a fixed chance.
///
/// Needed for dependency inversion: crossover only
/// cares about boolean outcomes, not about the
/// generator producing them.
pub struct RngCoin<'a, R: Rng + ?Sized> {
    rng: &'a mut R,
    chance: f64,
}

impl<'a, R> RngCoin<'a, R>
where
    R: Rng + ?Sized,
{
    /// A fair coin.
    ///
    /// # Examples
    /// ```
    /// use neatwork::{Coin, RngCoin};
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// let mut rng = ChaCha8Rng::seed_from_u64(7);
    /// let mut coin = RngCoin::new(&mut rng);
    /// let heads = (0..1000).filter(|_| coin.flip()).count();
    /// assert!((300..700).contains(&heads));
    /// ```
    pub fn new(rng: &'a mut R) -> RngCoin<'a, R> {
        Self::biased(rng, 0.5)
    }

    /// A coin landing `true` with probability `chance`,
    /// which is clamped into `[0, 1]`.
    pub fn biased(rng: &'a mut R, chance: f64) -> RngCoin<'a, R> {
        RngCoin {
            rng,
            chance: if chance.is_nan() { 0.5 } else { chance.clamp(0.0, 1.0) },
        }
    }
}

impl<R> Coin for RngCoin<'_, R>
where
    R: Rng + ?Sized,
{
    fn flip(&mut self) -> bool {
        self.rng.gen_bool(self.chance)
    }
}
