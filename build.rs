fn main() {
    // ESP-IDF link arguments only apply to target builds; host builds
    // (tests, tooling) must not inherit them.
    if std::env::var_os("CARGO_FEATURE_ESPIDF").is_some() {
        embuild::espidf::sysenv::output();
    }
}
