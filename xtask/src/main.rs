/// Delegates to nih_plug_xtask for the `bundle` subcommand:
///
///   cargo xtask bundle fracture-delay --release
///
/// This builds the cdylib and packages it as CLAP and VST3 bundles under
/// `target/bundled/`.
fn main() -> nih_plug_xtask::Result<()> {
    nih_plug_xtask::main()
}
