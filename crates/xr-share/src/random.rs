//! Random picks for REALITY links. Callers pass the generator in, so a seeded
//! one makes output reproducible.

use rand::distributions::Alphanumeric;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::defaults::SPIDER_X_LEN;

/// One entry of `items`, uniformly.
pub(crate) fn pick<'a, R: Rng + ?Sized>(rng: &mut R, items: &'a [String]) -> Option<&'a str> {
    items.choose(rng).map(String::as_str)
}

/// Fresh `spx` value: `/` followed by alphanumeric characters.
pub(crate) fn spider_x<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut out = String::with_capacity(SPIDER_X_LEN + 1);
    out.push('/');
    out.extend((0..SPIDER_X_LEN).map(|_| char::from(rng.sample(Alphanumeric))));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn spider_x_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        let spx = spider_x(&mut rng);
        assert_eq!(spx.len(), SPIDER_X_LEN + 1);
        assert!(spx.starts_with('/'));
        assert!(spx[1..].chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn same_seed_same_output() {
        let ids = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let mut first = StdRng::seed_from_u64(42);
        let mut second = StdRng::seed_from_u64(42);
        assert_eq!(pick(&mut first, &ids), pick(&mut second, &ids));
        assert_eq!(spider_x(&mut first), spider_x(&mut second));
        assert!(pick(&mut first, &[]).is_none());
    }
}
