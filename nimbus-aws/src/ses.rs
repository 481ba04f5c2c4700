//! Transactional email through the SES v2 API.
//!
//! Plain, templated and bulk templated sends, template management and the
//! account send quota.

use std::fmt;

use aws_sdk_sesv2::Client;
use aws_sdk_sesv2::operation::create_email_template::CreateEmailTemplateOutput;
use aws_sdk_sesv2::operation::delete_email_template::DeleteEmailTemplateOutput;
use aws_sdk_sesv2::operation::list_email_templates::ListEmailTemplatesOutput;
use aws_sdk_sesv2::operation::send_bulk_email::SendBulkEmailOutput;
use aws_sdk_sesv2::operation::send_email::SendEmailOutput;
use aws_sdk_sesv2::types::{
    Body, BulkEmailContent, BulkEmailEntry, Content, Destination, EmailContent,
    EmailTemplateContent, Message, ReplacementEmailContent, ReplacementTemplate, SendQuota,
    Template,
};
use nimbus_config::{ConfigService, ConfigValidator};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{AwsConfig, AwsError, Result};

const SERVICE: &str = "ses";
const CHARSET: &str = "UTF-8";

/// Configuration key holding the default sender.
pub const SENDER_EMAIL_KEY: &str = "AWS_SES_SENDER_EMAIL";

/// Sender used when neither the message nor the configuration names one.
pub const DEFAULT_SENDER: &str = "no-reply@example.com";

/// Email recipient with optional display name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Recipient {
    pub email: String,
    pub name: Option<String>,
}

impl Recipient {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: None,
        }
    }

    pub fn with_name(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: Some(name.into()),
        }
    }
}

impl fmt::Display for Recipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => write!(f, "{} <{}>", name, self.email),
            _ => write!(f, "{}", self.email),
        }
    }
}

impl From<&str> for Recipient {
    fn from(email: &str) -> Self {
        Self::new(email)
    }
}

/// Routing shared by plain and templated sends.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmailOptions {
    /// Falls back to the facade's default sender.
    pub from: Option<String>,
    pub to: Vec<Recipient>,
    #[serde(default)]
    pub cc: Vec<Recipient>,
    #[serde(default)]
    pub bcc: Vec<Recipient>,
    pub reply_to: Option<String>,
}

impl EmailOptions {
    pub fn new(to: impl IntoIterator<Item = impl Into<Recipient>>) -> Self {
        Self {
            to: to.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn sender(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    pub fn cc(mut self, recipient: impl Into<Recipient>) -> Self {
        self.cc.push(recipient.into());
        self
    }

    pub fn bcc(mut self, recipient: impl Into<Recipient>) -> Self {
        self.bcc.push(recipient.into());
        self
    }

    pub fn reply_to(mut self, address: impl Into<String>) -> Self {
        self.reply_to = Some(address.into());
        self
    }
}

/// A plain email with HTML and/or text bodies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendEmail {
    #[serde(flatten)]
    pub options: EmailOptions,
    pub subject: String,
    pub html: Option<String>,
    pub text: Option<String>,
}

/// An email rendered from a stored template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplatedEmail {
    #[serde(flatten)]
    pub options: EmailOptions,
    pub template: String,
    pub template_data: serde_json::Value,
}

/// One destination of a bulk send.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BulkDestination {
    pub to: Vec<Recipient>,
    #[serde(default)]
    pub cc: Vec<Recipient>,
    #[serde(default)]
    pub bcc: Vec<Recipient>,
    /// Replaces the default template data for this destination.
    pub template_data: Option<serde_json::Value>,
}

/// The same template sent to many destinations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkTemplatedEmail {
    pub from: String,
    pub template: String,
    pub default_template_data: Option<serde_json::Value>,
    pub destinations: Vec<BulkDestination>,
}

/// A stored email template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailTemplate {
    pub name: String,
    pub subject: String,
    pub html: String,
    pub text: Option<String>,
}

/// SES facade.
#[derive(Debug, Clone)]
pub struct SesService {
    client: Client,
    default_sender: String,
}

impl SesService {
    /// Build the client from configuration.
    pub fn new(config: &ConfigService) -> Result<Self> {
        let default_sender = config
            .get_optional(SENDER_EMAIL_KEY)?
            .unwrap_or_else(|| DEFAULT_SENDER.to_string());
        ConfigValidator::is_email(&default_sender, SENDER_EMAIL_KEY)?;

        let sdk_config = AwsConfig::from_config(config)?.sdk_config()?;
        let client = Client::new(&sdk_config);

        info!(default_sender = %default_sender, "SES client initialized");
        Ok(Self {
            client,
            default_sender,
        })
    }

    /// Create from an existing AWS SDK client.
    pub fn from_client(client: Client, default_sender: impl Into<String>) -> Self {
        Self {
            client,
            default_sender: default_sender.into(),
        }
    }

    /// Underlying SDK client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn default_sender(&self) -> &str {
        &self.default_sender
    }

    /// Send a plain email.
    pub async fn send_email(&self, email: SendEmail) -> Result<SendEmailOutput> {
        let from = self.sender(&email.options);
        debug!(from, to = email.options.to.len(), subject = %email.subject, "SES SendEmail");

        let content = simple_content(&email.subject, email.html.as_deref(), email.text.as_deref())?;

        self.client
            .send_email()
            .from_email_address(from)
            .destination(destination(&email.options.to, &email.options.cc, &email.options.bcc))
            .content(content)
            .set_reply_to_addresses(reply_to_addresses(&email.options))
            .send()
            .await
            .map_err(AwsError::upstream(SERVICE, "SendEmail"))
    }

    /// Send an email rendered from a stored template.
    pub async fn send_templated_email(&self, email: TemplatedEmail) -> Result<SendEmailOutput> {
        let from = self.sender(&email.options);
        debug!(from, to = email.options.to.len(), template = %email.template, "SES SendEmail");

        let template = Template::builder()
            .template_name(&email.template)
            .template_data(serde_json::to_string(&email.template_data)?)
            .build();

        self.client
            .send_email()
            .from_email_address(from)
            .destination(destination(&email.options.to, &email.options.cc, &email.options.bcc))
            .content(EmailContent::builder().template(template).build())
            .set_reply_to_addresses(reply_to_addresses(&email.options))
            .send()
            .await
            .map_err(AwsError::upstream(SERVICE, "SendEmail"))
    }

    /// Send one template to many destinations, each with its own data.
    pub async fn send_bulk_templated_email(
        &self,
        email: BulkTemplatedEmail,
    ) -> Result<SendBulkEmailOutput> {
        debug!(
            from = %email.from,
            template = %email.template,
            destinations = email.destinations.len(),
            "SES SendBulkEmail"
        );

        let template = Template::builder()
            .template_name(&email.template)
            .set_template_data(
                email
                    .default_template_data
                    .as_ref()
                    .map(serde_json::to_string)
                    .transpose()?,
            )
            .build();

        self.client
            .send_bulk_email()
            .from_email_address(&email.from)
            .default_content(BulkEmailContent::builder().template(template).build())
            .set_bulk_email_entries(Some(bulk_entries(&email.destinations)?))
            .send()
            .await
            .map_err(AwsError::upstream(SERVICE, "SendBulkEmail"))
    }

    pub async fn create_template(&self, template: EmailTemplate) -> Result<CreateEmailTemplateOutput> {
        debug!(name = %template.name, "SES CreateEmailTemplate");

        let content = EmailTemplateContent::builder()
            .subject(template.subject)
            .html(template.html)
            .set_text(template.text.filter(|t| !t.is_empty()))
            .build();

        self.client
            .create_email_template()
            .template_name(template.name)
            .template_content(content)
            .send()
            .await
            .map_err(AwsError::upstream(SERVICE, "CreateEmailTemplate"))
    }

    pub async fn delete_template(&self, name: &str) -> Result<DeleteEmailTemplateOutput> {
        debug!(name, "SES DeleteEmailTemplate");

        self.client
            .delete_email_template()
            .template_name(name)
            .send()
            .await
            .map_err(AwsError::upstream(SERVICE, "DeleteEmailTemplate"))
    }

    /// One page of stored templates.
    pub async fn list_templates(
        &self,
        next_token: Option<String>,
        page_size: Option<i32>,
    ) -> Result<ListEmailTemplatesOutput> {
        debug!(?page_size, "SES ListEmailTemplates");

        self.client
            .list_email_templates()
            .set_next_token(next_token)
            .set_page_size(page_size)
            .send()
            .await
            .map_err(AwsError::upstream(SERVICE, "ListEmailTemplates"))
    }

    /// Sending limits of the account. `None` when the account reports none.
    pub async fn get_send_quota(&self) -> Result<Option<SendQuota>> {
        debug!("SES GetAccount");

        let output = self
            .client
            .get_account()
            .send()
            .await
            .map_err(AwsError::upstream(SERVICE, "GetAccount"))?;

        Ok(output.send_quota)
    }

    fn sender<'a>(&'a self, options: &'a EmailOptions) -> &'a str {
        options.from.as_deref().unwrap_or(&self.default_sender)
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn reply_to_addresses(options: &EmailOptions) -> Option<Vec<String>> {
    present(options.reply_to.as_deref()).map(|r| vec![r.to_string()])
}

fn addresses(recipients: &[Recipient]) -> Vec<String> {
    recipients.iter().map(Recipient::to_string).collect()
}

fn destination(to: &[Recipient], cc: &[Recipient], bcc: &[Recipient]) -> Destination {
    Destination::builder()
        .set_to_addresses(Some(addresses(to)))
        .set_cc_addresses(Some(addresses(cc)))
        .set_bcc_addresses(Some(addresses(bcc)))
        .build()
}

fn utf8(data: &str) -> Result<Content> {
    Content::builder()
        .data(data)
        .charset(CHARSET)
        .build()
        .map_err(AwsError::invalid_request)
}

fn simple_content(subject: &str, html: Option<&str>, text: Option<&str>) -> Result<EmailContent> {
    let body = Body::builder()
        .set_html(present(html).map(utf8).transpose()?)
        .set_text(present(text).map(utf8).transpose()?)
        .build();

    let message = Message::builder().subject(utf8(subject)?).body(body).build();

    Ok(EmailContent::builder().simple(message).build())
}

fn bulk_entries(destinations: &[BulkDestination]) -> Result<Vec<BulkEmailEntry>> {
    destinations
        .iter()
        .map(|d| {
            let replacement = d
                .template_data
                .as_ref()
                .map(|data| {
                    let template = ReplacementTemplate::builder()
                        .replacement_template_data(serde_json::to_string(data)?)
                        .build();
                    Ok::<_, AwsError>(
                        ReplacementEmailContent::builder()
                            .replacement_template(template)
                            .build(),
                    )
                })
                .transpose()?;

            Ok::<_, AwsError>(
                BulkEmailEntry::builder()
                    .destination(destination(&d.to, &d.cc, &d.bcc))
                    .set_replacement_email_content(replacement)
                    .build(),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_rejects_malformed_sender() {
        let config = ConfigService::builder()
            .set("AWS_REGION", "us-east-1")
            .set("AWS_ACCESS_KEY_ID", "AKIDEXAMPLE")
            .set("AWS_SECRET_ACCESS_KEY", "secret")
            .set(SENDER_EMAIL_KEY, "not-an-address")
            .build()
            .unwrap();

        assert!(matches!(SesService::new(&config), Err(AwsError::Config(_))));
    }

    #[test]
    fn test_recipient_display() {
        assert_eq!(
            Recipient::with_name("ana@example.com", "Ana").to_string(),
            "Ana <ana@example.com>"
        );
        assert_eq!(Recipient::new("ana@example.com").to_string(), "ana@example.com");
        assert_eq!(
            Recipient::with_name("ana@example.com", "").to_string(),
            "ana@example.com"
        );
    }

    #[test]
    fn test_destination_defaults_to_empty_lists() {
        let d = destination(
            &[Recipient::with_name("a@example.com", "A"), "b@example.com".into()],
            &[],
            &[],
        );

        assert_eq!(d.to_addresses(), ["A <a@example.com>", "b@example.com"]);
        assert_eq!(d.cc_addresses, Some(vec![]));
        assert_eq!(d.bcc_addresses, Some(vec![]));
    }

    #[test]
    fn test_simple_content_charset() {
        let content = simple_content("Hola", Some("<p>hola</p>"), None).unwrap();
        let message = content.simple().unwrap();

        let subject = message.subject().unwrap();
        assert_eq!(subject.data(), "Hola");
        assert_eq!(subject.charset(), Some("UTF-8"));

        let body = message.body().unwrap();
        assert_eq!(body.html().unwrap().data(), "<p>hola</p>");
        assert!(body.text().is_none());
    }

    #[test]
    fn test_empty_parts_are_omitted() {
        let content = simple_content("Hola", Some(""), Some("")).unwrap();
        let body = content.simple().unwrap().body().unwrap();
        assert!(body.html().is_none());
        assert!(body.text().is_none());

        let mut options = EmailOptions::new(["ana@example.com"]);
        assert!(reply_to_addresses(&options).is_none());
        options.reply_to = Some(String::new());
        assert!(reply_to_addresses(&options).is_none());
        options.reply_to = Some("help@example.com".to_string());
        assert_eq!(reply_to_addresses(&options), Some(vec!["help@example.com".to_string()]));
    }

    #[test]
    fn test_bulk_entries_replacement_data() {
        let destinations = vec![
            BulkDestination {
                to: vec!["a@example.com".into()],
                template_data: Some(json!({"name": "A"})),
                ..Default::default()
            },
            BulkDestination {
                to: vec!["b@example.com".into()],
                ..Default::default()
            },
        ];

        let entries = bulk_entries(&destinations).unwrap();

        assert_eq!(entries.len(), 2);
        let replacement = entries[0]
            .replacement_email_content()
            .and_then(|c| c.replacement_template())
            .and_then(|t| t.replacement_template_data());
        assert_eq!(replacement, Some(r#"{"name":"A"}"#));
        assert!(entries[1].replacement_email_content().is_none());
    }

    #[test]
    fn test_email_options_builder() {
        let options = EmailOptions::new(["a@example.com"])
            .cc(Recipient::with_name("c@example.com", "C"))
            .reply_to("support@example.com");

        assert_eq!(options.to.len(), 1);
        assert_eq!(options.cc[0].name.as_deref(), Some("C"));
        assert!(options.bcc.is_empty());
        assert!(options.from.is_none());
    }
}
