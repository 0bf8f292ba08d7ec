//! Parsers generated by pegc when this crate is built
//!
//! Each module holds the Rust code generated from one grammar (see `build.rs`).

macro_rules! generated {
    ($($name: ident),*) => {
        $(
            pub mod $name {
                include!(concat!(env!("OUT_DIR"), "/", stringify!($name), ".rs"));
            }
        )*
    };
}

generated!(calc, shadowing, backref, lists);
