use crate::config::toml_config::AppSettings;
use crate::core::domains::{most_common_domain, DomainFilter};
use crate::core::placement::{composite, fit_overlay_image, fit_text};
use crate::core::source::ImageResolver;
use crate::core::text::TrueTypeFont;
use crate::core::xapi::{read_participant_emails, switch_payload, upload_payload, BLUR_PAYLOAD};
use crate::domain::model::{BackgroundSlot, Command, LogoSource};
use crate::domain::ports::{ControlChannel, Storage};
use crate::utils::error::{LogoError, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, ImageFormat, ImageReader};
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// Copy of every uploaded image, kept in the cache folder.
pub const RESULT_FILE: &str = "_result.jpg";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Help,
    Switched(BackgroundSlot),
    Uploaded {
        slot: BackgroundSlot,
        result_file: PathBuf,
    },
}

/// Image encoding used for the upload body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadFormat {
    Png,
    Jpeg,
}

impl UploadFormat {
    /// PNG when the image the upload is derived from is a PNG file.
    pub fn for_source(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("png") => Self::Png,
            _ => Self::Jpeg,
        }
    }
}

pub struct LogoEngine<S: Storage, C: ControlChannel> {
    settings: AppSettings,
    storage: S,
    channel: C,
    resolver: ImageResolver,
}

impl<S: Storage, C: ControlChannel> LogoEngine<S, C> {
    pub fn new(settings: AppSettings, storage: S, channel: C) -> Result<Self> {
        let resolver = ImageResolver::new(&settings.logo_service_url, settings.request_timeout)?;
        Ok(Self {
            settings,
            storage,
            channel,
            resolver,
        })
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    /// Runs one command to completion. The first failure aborts the run;
    /// whatever the device already accepted stays in place.
    pub async fn run(&self, command: Command) -> Result<RunOutcome> {
        let slot = self.settings.background_slot;

        match command {
            Command::Help => Ok(RunOutcome::Help),
            Command::Switch(target) => {
                tracing::info!("🔀 switching to {}", target);
                self.channel.send(&switch_payload(target)).await?;
                Ok(RunOutcome::Switched(target))
            }
            Command::Clear => {
                tracing::info!("🧹 removing logo from background");
                let background = self.load_background()?;
                self.upload(slot, &background, self.background_format()).await
            }
            Command::ReplaceBackground(target, source) => {
                tracing::info!("🖼️ new background for {}: {:?}", target, source);
                let path = self.resolver.resolve(&self.storage, &source).await?;
                let image = open_image(&path)?;
                self.upload(target, &image, UploadFormat::for_source(&path)).await
            }
            Command::Embed(LogoSource::Text(text)) => {
                tracing::info!("✏️ embedding text in background");
                let mut background = self.load_background()?;
                self.embed_text(&mut background, &text)?;
                self.upload(slot, &background, self.background_format()).await
            }
            Command::Embed(source) => self.embed_logo(source).await,
            Command::AutoDetect => {
                tracing::info!("👥 reading participants from the device");
                let emails = read_participant_emails(&self.channel).await?;
                let filter = DomainFilter::new(&self.settings.ignored_domains);
                let domain = most_common_domain(&emails, &filter)?;
                tracing::info!("most common participant domain: {}", domain);
                self.embed_logo(LogoSource::BareDomain(domain)).await
            }
        }
    }

    async fn embed_logo(&self, source: LogoSource) -> Result<RunOutcome> {
        let logo_path = self.resolver.resolve(&self.storage, &source).await?;
        let logo = open_image(&logo_path)?;

        let mut background = self.load_background()?;
        let rect = &self.settings.logo_area;
        rect.ensure_within(background.width(), background.height())?;

        let (logo, placement) = fit_overlay_image(&logo, rect, self.settings.scale_logo)?;
        tracing::debug!("logo placement: {:?}", placement);

        let mut canvas = background.to_rgba8();
        composite(&mut canvas, &logo.to_rgba8(), placement.offset_x, placement.offset_y);
        background = DynamicImage::ImageRgba8(canvas);

        self.upload(
            self.settings.background_slot,
            &background,
            UploadFormat::for_source(&logo_path),
        )
        .await
    }

    fn embed_text(&self, background: &mut DynamicImage, text: &str) -> Result<()> {
        let font = TrueTypeFont::locate(self.settings.font_file.as_deref())?;
        tracing::debug!("font: {}", font.path().display());
        let placement = fit_text(
            text,
            &self.settings.logo_area,
            &font,
            self.settings.font_size,
            self.settings.min_font_size,
        )?;
        tracing::debug!(
            "text placement: size {} at ({}, {})",
            placement.font_size,
            placement.offset_x,
            placement.offset_y
        );

        let overlay = font.render(&placement.lines, placement.font_size, self.settings.font_color);
        let mut canvas = background.to_rgba8();
        composite(&mut canvas, &overlay, placement.offset_x, placement.offset_y);
        *background = DynamicImage::ImageRgba8(canvas);
        Ok(())
    }

    fn load_background(&self) -> Result<DynamicImage> {
        let path = &self.settings.background_file;
        if !path.is_file() {
            return Err(LogoError::input(format!(
                "background file '{}' cannot be found",
                path.display()
            )));
        }
        open_image(path)
    }

    fn background_format(&self) -> UploadFormat {
        UploadFormat::for_source(&self.settings.background_file)
    }

    /// Uploads the image to `slot`, then flips the device to blur and back so
    /// the new image is shown.
    async fn upload(
        &self,
        slot: BackgroundSlot,
        image: &DynamicImage,
        format: UploadFormat,
    ) -> Result<RunOutcome> {
        let body = encode_image(image, format)?;
        let result_jpeg = encode_image(image, UploadFormat::Jpeg)?;
        self.storage.write_file(RESULT_FILE, &result_jpeg).await?;

        tracing::info!("⬆️ uploading background to {} ({:?}, {} bytes)", slot, format, body.len());
        self.channel
            .send(&upload_payload(slot, &STANDARD.encode(&body)))
            .await?;

        self.channel.send(BLUR_PAYLOAD).await?;
        self.channel.send(&switch_payload(slot)).await?;

        Ok(RunOutcome::Uploaded {
            slot,
            result_file: self.storage.full_path(RESULT_FILE),
        })
    }
}

fn open_image(path: &Path) -> Result<DynamicImage> {
    let image = ImageReader::open(path)?.with_guessed_format()?.decode()?;
    Ok(image)
}

/// Encodes the image; JPEG drops the alpha channel.
pub fn encode_image(image: &DynamicImage, format: UploadFormat) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    match format {
        UploadFormat::Png => image.write_to(&mut buffer, ImageFormat::Png)?,
        UploadFormat::Jpeg => {
            DynamicImage::ImageRgb8(image.to_rgb8()).write_to(&mut buffer, ImageFormat::Jpeg)?
        }
    }
    Ok(buffer.into_inner())
}
