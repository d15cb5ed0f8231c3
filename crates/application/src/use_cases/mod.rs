pub mod resolve;

pub use resolve::ResolveQueryUseCase;
