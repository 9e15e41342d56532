use std::fmt;

/// Error type for every GeoLLM operation
/// Implements Clone so results can be logged and returned together
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error
{   /// Model name is in neither supported list
    UnsupportedModel(String)
  , /// Request kind has no registered prompt or schema
    Registration(String)
  , /// API key is missing for a provider
    MissingApiKey(String)
  , /// HTTP request error
    HttpError(String)
  , /// API returned an error response
    ApiError(String)
  , /// Failed to parse API response
    ParseError(String)
  , /// Model output could not be coerced into the schema
    Validation(String)
  , /// No choices in API response
    NoChoicesInResponse
  , /// Invalid configuration
    InvalidConfiguration(String)
  , /// Generic error
    Other(String)
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error
{   /// Stable code reported to HTTP callers
    pub fn code(&self) -> &'static str
    {   match self
        {   Error::UnsupportedModel(_) => "UNSUPPORTED_MODEL"
          , Error::Registration(_) => "UNREGISTERED_KIND"
          , Error::MissingApiKey(_) => "MISSING_API_KEY"
          , Error::HttpError(_) => "HTTP_ERROR"
          , Error::ApiError(_) => "PROVIDER_ERROR"
          , Error::ParseError(_) => "PARSE_ERROR"
          , Error::Validation(_) => "VALIDATION_ERROR"
          , Error::NoChoicesInResponse => "EMPTY_RESPONSE"
          , Error::InvalidConfiguration(_) => "INVALID_CONFIGURATION"
          , Error::Other(_) => "INTERNAL_ERROR"
        }
    }
}

impl fmt::Display for Error
{   fn fmt(&self, f: &mut fmt::Formatter<'_>)
      -> fmt::Result
    {   match self
        {   Error::UnsupportedModel(msg) => {
              write!(f, "{}", msg)
            }
          , Error::Registration(msg) => {
              write!(f, "{}", msg)
            }
          , Error::MissingApiKey(provider) => {
              write!(f, "Missing API key for: {}", provider)
            }
          , Error::HttpError(msg) => {
              write!(f, "HTTP error: {}", msg)
            }
          , Error::ApiError(msg) => {
              write!(f, "API error: {}", msg)
            }
          , Error::ParseError(msg) => {
              write!(f, "Parse error: {}", msg)
            }
          , Error::Validation(msg) => {
              write!(f, "Validation error: {}", msg)
            }
          , Error::NoChoicesInResponse => {
              write!(f, "API response contained no choices")
            }
          , Error::InvalidConfiguration(msg) => {
              write!(f, "Invalid configuration: {}", msg)
            }
          , Error::Other(msg) => {
              write!(f, "Error: {}", msg)
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<String> for Error
{   fn from(s: String) -> Self
    {   Error::Other(s)
    }
}

impl From<&str> for Error
{   fn from(s: &str) -> Self
    {   Error::Other(s.to_string())
    }
}
