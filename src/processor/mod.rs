pub mod change_decoder;
