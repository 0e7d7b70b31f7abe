//! Database layer: connection supervision, migrations, and repositories for
//! uploads and decoded QR codes.

pub mod connect;
pub mod qr_codes;
pub mod uploads;

pub use connect::{connect_with_retry, ping, run_migrations, tables_exist};
pub use qr_codes::QrCodeRepository;
pub use uploads::UploadRepository;
