pub mod agglomerative;
pub mod kmeans;


pub use agglomerative::{ClusterSet, Merge};
pub use kmeans::{DEFAULT_MAX_ITERATIONS, KMeansResult};
