pub mod minimal;
pub mod themed;

pub use minimal::MinimalAdapter;
pub use themed::ThemedAdapter;
