pub mod document;
pub mod equal;
pub mod fetcher;
pub mod manual;
pub mod namer;
pub mod outline;
pub mod resolver;
pub mod scanner;
pub mod splitter;
pub mod suggester;

pub use document::{PageSource, PdfDocument};
pub use equal::EqualSplitter;
pub use fetcher::ContentFetcher;
pub use manual::ManualRangeParser;
pub use namer::OutputNamer;
pub use outline::OutlineFlattener;
pub use resolver::RangeResolver;
pub use scanner::TextHeuristicScanner;
pub use splitter::DocumentSplitter;
pub use suggester::{BoundarySuggester, GeminiSuggester};
