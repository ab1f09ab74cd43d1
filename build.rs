fn main() {
    // Host builds (no `espidf` feature) have nothing to generate.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
