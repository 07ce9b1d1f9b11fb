pub mod chromosome;
pub mod settings;
pub mod window;

// re-export for cleaner imports
pub use self::chromosome::{Chromosome, ChromosomeCatalog, Genome};
pub use self::settings::{AggregationMethod, Precision};
pub use self::window::ScoredWindow;
