//! Kernel functions for SVM

pub mod function;
pub mod gram;
pub mod linear;
pub mod rbf;
pub mod traits;

pub use self::function::*;
pub use self::gram::*;
pub use self::linear::*;
pub use self::rbf::RBFKernel;
pub use self::traits::*;
