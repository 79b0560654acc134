use crate::domain::model::{BackgroundSlot, Command, LogoSource};
use crate::utils::error::{LogoError, Result};
use url::Url;

/// Image extensions accepted as local files.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Turns the joined command-line words into a [`Command`].
pub fn parse_command(line: &str) -> Result<Command> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Command::AutoDetect);
    }

    let (first, rest) = match line.split_once(char::is_whitespace) {
        Some((first, rest)) => (first, rest.trim()),
        None => (line, ""),
    };
    let keyword = first.to_lowercase();

    match keyword.as_str() {
        "help" => Ok(Command::Help),
        "clear" => {
            if !rest.is_empty() {
                tracing::debug!("ignoring arguments after 'clear': {}", rest);
            }
            Ok(Command::Clear)
        }
        "text" => {
            if rest.is_empty() {
                return Err(LogoError::input("'text' needs a message, e.g. text Welcome##ACME"));
            }
            Ok(Command::Embed(LogoSource::Text(rest.to_string())))
        }
        "user1" | "user2" | "user3" => {
            let slot: BackgroundSlot = keyword.parse()?;
            if rest.is_empty() {
                Ok(Command::Switch(slot))
            } else {
                Ok(Command::ReplaceBackground(slot, classify_source(rest)?))
            }
        }
        _ => Ok(Command::Embed(classify_source(line)?)),
    }
}

/// Decides what kind of logo source a token is. Checked in order: e-mail,
/// URL, local image file, bare domain.
pub fn classify_source(token: &str) -> Result<LogoSource> {
    let token = token.trim();

    if let Some((_, domain)) = token.rsplit_once('@') {
        if !domain.contains('.') {
            return Err(LogoError::input(format!(
                "customer domain doesn't contain a '.': '{}'",
                domain
            )));
        }
        return Ok(LogoSource::Email(token.to_string()));
    }

    let lower = token.to_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        let url = Url::parse(token)
            .map_err(|e| LogoError::input(format!("invalid image URL '{}': {}", token, e)))?;
        return Ok(LogoSource::Url(url));
    }

    if let Some((_, ext)) = lower.rsplit_once('.') {
        if IMAGE_EXTENSIONS.contains(&ext) {
            return Ok(LogoSource::LocalFile(token.to_string()));
        }
    }

    if !token.contains('.') || token.contains(char::is_whitespace) {
        return Err(LogoError::input(format!(
            "customer domain doesn't look like a domain: '{}'",
            token
        )));
    }
    Ok(LogoSource::BareDomain(token.to_string()))
}

/// Usage text, with the configured slot filled in.
pub fn help_text(slot: BackgroundSlot) -> String {
    format!(
        r#"
 Webex Virtual Background logo insertion

Options: (replace uppercase text)
  DOMAIN/EMAIL            - add logo to background in {slot}
  FILE_NAME/URL           - add logo to background in {slot}
  (no argument)           - add logo of the most common participant domain
  clear                   - remove logo
  user1/2/3               - switch to background user1/2/3
  user1/2/3 FILE_NAME/URL - upload background to user1/2/3
  text YOUR_TEXT          - add text to background in {slot}
  text TEXT##ON##NEWLINE  - add multiline text to background
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command_forms() {
        assert_eq!(parse_command("").unwrap(), Command::AutoDetect);
        assert_eq!(parse_command("   ").unwrap(), Command::AutoDetect);
        assert_eq!(parse_command("help").unwrap(), Command::Help);
        assert_eq!(parse_command("clear").unwrap(), Command::Clear);
        assert_eq!(
            parse_command("User2").unwrap(),
            Command::Switch(BackgroundSlot::User2)
        );
        assert_eq!(
            parse_command("user1 office.jpg").unwrap(),
            Command::ReplaceBackground(
                BackgroundSlot::User1,
                LogoSource::LocalFile("office.jpg".to_string())
            )
        );
        assert_eq!(
            parse_command("text Welcome to##ACME Corp").unwrap(),
            Command::Embed(LogoSource::Text("Welcome to##ACME Corp".to_string()))
        );
        assert_eq!(
            parse_command("cisco.com").unwrap(),
            Command::Embed(LogoSource::BareDomain("cisco.com".to_string()))
        );
    }

    #[test]
    fn test_clear_ignores_trailing_words() {
        assert_eq!(parse_command("clear logo now").unwrap(), Command::Clear);
        assert_eq!(parse_command("CLEAR").unwrap(), Command::Clear);
    }

    #[test]
    fn test_text_without_message_fails() {
        assert!(parse_command("text").is_err());
    }

    #[test]
    fn test_replace_background_with_url() {
        let command = parse_command("user3 https://example.com/bg/beach.jpg").unwrap();
        match command {
            Command::ReplaceBackground(BackgroundSlot::User3, LogoSource::Url(url)) => {
                assert_eq!(url.path(), "/bg/beach.jpg");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_classify_sources() {
        assert_eq!(
            classify_source("jane@customer.com").unwrap(),
            LogoSource::Email("jane@customer.com".to_string())
        );
        assert!(matches!(
            classify_source("https://example.com/logo.png").unwrap(),
            LogoSource::Url(_)
        ));
        assert_eq!(
            classify_source("Logo.PNG").unwrap(),
            LogoSource::LocalFile("Logo.PNG".to_string())
        );
        assert_eq!(
            classify_source("www.acme.org").unwrap(),
            LogoSource::BareDomain("www.acme.org".to_string())
        );
    }

    #[test]
    fn test_invalid_domains() {
        assert!(classify_source("jane@localhost").is_err());
        assert!(classify_source("acme").is_err());
        assert!(parse_command("not a domain").is_err());
    }

    #[test]
    fn test_help_mentions_slot() {
        assert!(help_text(BackgroundSlot::User3).contains("background in User3"));
    }
}
