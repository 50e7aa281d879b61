//! LOGIN and the SASL LOGIN / CRAM-MD5 exchanges.

use hmac::{Hmac, Mac};
use md5::Md5;
use tidemail_mime::encoding::{decode_base64, encode_base64};

use super::Session;
use crate::command::{Command, LoginType};
use crate::connection::Transport;
use crate::parser::response::{
    Status, continuation_text, is_continuation, is_tagged_completion, line_text, parse_completion,
};
use crate::{Error, Result};

impl<T: Transport> Session<T> {
    /// Authenticates with the given mechanism.
    ///
    /// A NO from the server is reported as [`Error::Auth`].
    pub async fn login(
        &mut self,
        username: &str,
        password: &str,
        login_type: LoginType,
    ) -> Result<()> {
        let result = match login_type {
            LoginType::Plain => self.login_plain(username, password).await,
            LoginType::Authenticate => self.login_authenticate(username, password).await,
            LoginType::CramMd5 => self.login_cram_md5(username, password).await,
        };
        let result = result.map_err(|error| match error {
            Error::No(text) => Error::Auth(text),
            other => other,
        });
        self.record(result)
    }

    async fn login_plain(&mut self, username: &str, password: &str) -> Result<()> {
        let tag = self
            .send_command(&Command::Login {
                username: username.to_string(),
                password: password.to_string(),
            })
            .await?;
        self.finish(&tag).await.map(drop)
    }

    async fn login_authenticate(&mut self, username: &str, password: &str) -> Result<()> {
        let tag = self.send_authenticate("LOGIN").await?;

        self.read_challenge(&tag).await?;
        self.send_data_line(&encode_base64(username.as_bytes())).await?;

        self.read_challenge(&tag).await?;
        self.send_data_line(&encode_base64(password.as_bytes())).await?;

        self.finish(&tag).await.map(drop)
    }

    async fn login_cram_md5(&mut self, username: &str, password: &str) -> Result<()> {
        let tag = self.send_authenticate("CRAM-MD5").await?;

        let challenge = self.read_challenge(&tag).await?;
        let challenge = decode_base64(&String::from_utf8_lossy(&challenge))?;
        let answer = cram_md5_response(username, password, &challenge)?;
        self.send_data_line(&answer).await?;

        self.finish(&tag).await.map(drop)
    }

    async fn send_authenticate(&mut self, mechanism: &str) -> Result<String> {
        self.send_command(&Command::Authenticate {
            mechanism: mechanism.to_string(),
        })
        .await
    }

    /// Waits for the server's `+` line and returns its payload.
    async fn read_challenge(&mut self, tag: &str) -> Result<Vec<u8>> {
        loop {
            let line = self.read_response().await?;
            if is_continuation(&line) {
                return Ok(continuation_text(&line).to_vec());
            }
            if let Some(completion) = parse_completion(&line, tag) {
                return Err(match completion.status {
                    Status::No => Error::No(completion.text),
                    Status::Bad => Error::Bad(completion.text),
                    Status::Ok => Error::Protocol(
                        "authentication completed before the exchange finished".to_string(),
                    ),
                });
            }
            if is_tagged_completion(&line) {
                return Err(Error::Protocol(format!(
                    "unexpected tagged response: {}",
                    line_text(&line)
                )));
            }
        }
    }
}

/// `base64(username + " " + hex(HMAC-MD5(password, challenge)))`.
fn cram_md5_response(username: &str, password: &str, challenge: &[u8]) -> Result<String> {
    let mut mac = Hmac::<Md5>::new_from_slice(password.as_bytes())
        .map_err(|_| Error::Auth("invalid CRAM-MD5 key".to_string()))?;
    mac.update(challenge);
    let digest = mac.finalize().into_bytes();

    let hex: String = digest.iter().map(|byte| format!("{byte:02x}")).collect();
    Ok(encode_base64(format!("{username} {hex}").as_bytes()))
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;
    use crate::command::TagGenerator;
    use crate::connection::FramedTransport;
    use tokio_test::io::Builder;

    fn session(mock: tokio_test::io::Mock) -> Session<FramedTransport<tokio_test::io::Mock>> {
        Session::with_tags(FramedTransport::new(mock), TagGenerator::new("A"))
    }

    #[test]
    fn test_cram_md5_known_answer() {
        let answer = cram_md5_response(
            "tim",
            "tanstaaftanstaaf",
            b"<1896.697170952@postoffice.reston.mci.net>",
        )
        .unwrap();
        assert_eq!(answer, "dGltIGI5MTNhNjAyYzdlZGE3YTQ5NWI0ZTZlNzMzNGQzODkw");
    }

    #[tokio::test]
    async fn test_login_plain() {
        let mock = Builder::new()
            .write(b"A0000 LOGIN tim \"secret word\"\r\n")
            .read(b"A0000 OK LOGIN completed\r\n")
            .build();
        let mut session = session(mock);

        session
            .login("tim", "secret word", LoginType::Plain)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_login_rejected() {
        let mock = Builder::new()
            .write(b"A0000 LOGIN tim wrong\r\n")
            .read(b"A0000 NO [AUTHENTICATIONFAILED] Invalid credentials\r\n")
            .build();
        let mut session = session(mock);

        let error = session.login("tim", "wrong", LoginType::Plain).await.unwrap_err();
        assert!(matches!(error, Error::Auth(_)));
        assert_eq!(
            session.error_string(),
            "[AUTHENTICATIONFAILED] Invalid credentials"
        );
    }

    #[tokio::test]
    async fn test_authenticate_login() {
        let mock = Builder::new()
            .write(b"A0000 AUTHENTICATE LOGIN\r\n")
            .read(b"+ VXNlcm5hbWU6\r\n")
            .write(b"dGlt\r\n")
            .read(b"+ UGFzc3dvcmQ6\r\n")
            .write(b"c2VjcmV0\r\n")
            .read(b"A0000 OK AUTHENTICATE completed\r\n")
            .build();
        let mut session = session(mock);

        session
            .login("tim", "secret", LoginType::Authenticate)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_cram_md5_exchange() {
        let mock = Builder::new()
            .write(b"A0000 AUTHENTICATE CRAM-MD5\r\n")
            .read(b"+ PDE4OTYuNjk3MTcwOTUyQHBvc3RvZmZpY2UucmVzdG9uLm1jaS5uZXQ+\r\n")
            .write(b"dGltIGI5MTNhNjAyYzdlZGE3YTQ5NWI0ZTZlNzMzNGQzODkw\r\n")
            .read(b"A0000 OK CRAM authentication successful\r\n")
            .build();
        let mut session = session(mock);

        session
            .login("tim", "tanstaaftanstaaf", LoginType::CramMd5)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_mechanism_refused() {
        let mock = Builder::new()
            .write(b"A0000 AUTHENTICATE CRAM-MD5\r\n")
            .read(b"A0000 BAD unsupported mechanism\r\n")
            .build();
        let mut session = session(mock);

        let error = session
            .login("tim", "pw", LoginType::CramMd5)
            .await
            .unwrap_err();
        assert!(matches!(error, Error::Bad(_)));
        assert_eq!(session.error_string(), "unsupported mechanism");
    }
}
