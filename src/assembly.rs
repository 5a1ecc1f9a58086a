//! Assembly of global tensors from local element tensors.
//!
//! A [`Form`] describes what to integrate: it computes local tensors on cells and facets and
//! maps them to global degrees of freedom. The [`Assembler`] visits the entities of a mesh,
//! respecting the subdomain each integral is restricted to, and scatters the local tensors
//! into a [`GlobalTensor`].
mod forms;
mod global;
mod local;
mod tensor;

pub use forms::*;
pub use global::*;
pub use local::*;
pub use tensor::*;
