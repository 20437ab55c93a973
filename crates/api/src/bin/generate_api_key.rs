//! Print a fresh random key for `SERVICE_API_KEY`.

fn main() {
    println!("{}", mediadesk_core::api_keys::generate_api_key());
}
