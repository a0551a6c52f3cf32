// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # shape-captions
//!
//! Caption semantics and generation for synthetic shape worlds.
//!
//! ## Architecture
//!
//! - **Predication** (`predication`): three-way partition of a world's
//!   entities into agreeing, ambiguous and disagreeing, narrowed as a
//!   caption is built or evaluated
//! - **Caption AST** (`caption`): attributes, types, relations, selectors,
//!   existentials, quantifiers and propositions with ternary evaluation
//! - **Interval semantics** (`caption::interval`): quantifier truth over
//!   count intervals driven by ambiguous entities
//! - **Captioners** (`captioner`): one stochastic sampler per grammar
//!   production, composed into a read-only tree that builds correct
//!   captions and mutates them into provably incorrect ones
//! - **Driver** (`driver`): retry loop per world and reproducible parallel
//!   batch generation
//!
//! ## Library usage
//!
//! ```no_run
//! use rand::SeedableRng;
//! use shape_captions::captioner::Mode;
//! use shape_captions::presets;
//!
//! let config = presets::load("existential").unwrap();
//! let (generator, sampler) = config.build().unwrap();
//! let mut rng = rand::rngs::StdRng::seed_from_u64(7);
//! let world = sampler.sample(&mut rng).unwrap();
//! if let Some(generated) = generator.generate_caption(&world, true, Mode::Train, &mut rng) {
//!     println!("{:#}", generator.model(&generated));
//! }
//! ```

pub mod caption;
pub mod captioner;
pub mod config;
pub mod driver;
pub mod error;
pub mod policy;
pub mod predication;
pub mod presets;
pub mod world;
