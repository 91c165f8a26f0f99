use anyhow::*;
use fs_extra::copy_items;
use fs_extra::dir::CopyOptions;
use std::env;
use std::path::PathBuf;

// Local assets read from OUT_DIR/assets at runtime (remote models are fetched over HTTP).
const LOCAL_ASSETS: [&str; 7] = [
    "chocolate_bar_regular.json",
    "environment/px.png",
    "environment/nx.png",
    "environment/py.png",
    "environment/ny.png",
    "environment/pz.png",
    "environment/nz.png",
];

fn main() -> Result<()> {
    println!("cargo:rerun-if-changed=assets/");

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let assets_src = manifest_dir.join("assets");
    if !assets_src.exists() {
        println!("cargo:warning=no assets/ directory; the scene will render without its title and skybox");
        return Ok(());
    }
    for asset in LOCAL_ASSETS {
        if !assets_src.join(asset).exists() {
            println!("cargo:warning=missing local asset assets/{asset}");
        }
    }

    let out_dir = env::var("OUT_DIR")?;
    let mut copy_options = CopyOptions::new();
    copy_options.overwrite = true;
    copy_items(&[assets_src], out_dir, &copy_options)?;

    Ok(())
}
