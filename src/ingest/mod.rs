/// Upstream access: the resilient fetcher and the response normalizer.
pub mod fetcher;
pub mod normalize;

#[cfg(test)]
pub(crate) mod fixtures;
