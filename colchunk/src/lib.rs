pub use builder::*;
pub use colchunk_array::*;
pub use encoded::*;
pub use {colchunk_buffer as buffer, colchunk_error as error};

pub mod encodings {
    pub use colchunk_decimal as decimal;
}

mod builder;
mod encoded;
