use anyhow::{Result, bail};
use colored::Colorize;
use proofing_core::gallery::GalleryState;

use crate::context::AppContext;

pub async fn list(ctx: &AppContext, folder: &str) -> Result<()> {
    let gallery = ctx.gallery()?;
    match gallery.load(folder).await {
        GalleryState::Ready { photos } => {
            for (i, photo) in photos.iter().enumerate() {
                println!("{:>4}  {}  {}", i + 1, photo.id.bright_white(), photo.name);
            }
            println!("{}", format!("{} photo(s)", photos.len()).bright_black());
        }
        GalleryState::Empty => println!("{}", "The folder has no photos.".yellow()),
        GalleryState::Failed { message } => bail!("Could not list photos: {}", message),
        GalleryState::Loading => {}
    }
    Ok(())
}
