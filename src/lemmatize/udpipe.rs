/*! UDPipe 2 backend

Uses the UDPipe REST service (`/models` and `/process` endpoints), with tokenization and tagging enabled.
The service answers in CoNLL-U, which is parsed by [parse_conllu].
!*/
use std::{collections::HashMap, time::Duration};

use log::debug;
use reqwest::blocking::Client;
use serde::Deserialize;
use url::Url;

use crate::{error::Error, lang::Lang};

use super::{Morphology, MorphologyBuilder, Token};

pub const DEFAULT_URL: &str = "https://lindat.mff.cuni.cz/services/udpipe/api/";
const TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Deserialize)]
struct ModelsResponse {
    models: HashMap<String, Vec<String>>,
}

#[derive(Deserialize)]
struct ProcessResponse {
    result: String,
}

/// Model name prefix for a given language.
pub fn default_model(lang: Lang) -> Option<&'static str> {
    match lang {
        Lang::Ru => Some("russian"),
        Lang::El => Some("greek"),
        Lang::En => Some("english"),
        Lang::Unknown => None,
    }
}

/// Resolves a model on the service, then hands out a [Udpipe] pipeline.
pub struct UdpipeBuilder {
    base: Url,
    model_prefix: String,
}

impl UdpipeBuilder {
    pub fn new(base: &str, model_prefix: &str) -> Result<Self, Error> {
        // a missing trailing slash would make joins replace the last segment
        let base = if base.ends_with('/') {
            Url::parse(base)?
        } else {
            Url::parse(&format!("{base}/"))?
        };
        Ok(Self {
            base,
            model_prefix: model_prefix.to_string(),
        })
    }

    /// Builder using the default model of `lang`.
    pub fn for_lang(base: &str, lang: Lang) -> Result<Self, Error> {
        let prefix = default_model(lang).ok_or(Error::UnsupportedLang(lang))?;
        Self::new(base, prefix)
    }
}

impl MorphologyBuilder for UdpipeBuilder {
    fn build(&self) -> Result<Box<dyn Morphology>, Error> {
        let client = Client::builder().timeout(TIMEOUT).build()?;
        let models: ModelsResponse = client
            .get(self.base.join("models")?)
            .send()?
            .error_for_status()?
            .json()?;

        // model names end with a release date, the last one is the most recent
        let model = models
            .models
            .keys()
            .filter(|name| name.starts_with(&self.model_prefix))
            .max()
            .cloned()
            .ok_or_else(|| {
                Error::Config(format!(
                    "no UDPipe model matching {} at {}",
                    self.model_prefix, self.base
                ))
            })?;
        debug!("using UDPipe model {model}");

        Ok(Box::new(Udpipe {
            client,
            process: self.base.join("process")?,
            model,
        }))
    }
}

/// A resolved UDPipe model.
pub struct Udpipe {
    client: Client,
    process: Url,
    model: String,
}

impl Morphology for Udpipe {
    fn analyze(&self, text: &str) -> Result<Vec<Token>, Error> {
        let params = [
            ("data", text),
            ("model", self.model.as_str()),
            ("tokenizer", ""),
            ("tagger", ""),
        ];
        let response: ProcessResponse = self
            .client
            .post(self.process.clone())
            .form(&params)
            .send()?
            .error_for_status()?
            .json()?;
        Ok(parse_conllu(&response.result))
    }
}

/// Extract syntactic words from a CoNLL-U document.
///
/// Comments, multiword token ranges (`1-2`) and empty nodes (`1.1`) are skipped.
/// An `_` lemma is considered missing.
pub fn parse_conllu(conllu: &str) -> Vec<Token> {
    conllu
        .lines()
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let mut cols = line.split('\t');
            let id = cols.next()?;
            if id.contains(['-', '.']) {
                return None;
            }
            let form = cols.next()?;
            let lemma = cols.next()?;
            let upos = cols.next()?;
            let lemma = (lemma != "_").then_some(lemma);
            Some(Token::new(form, lemma, upos))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "# newdoc\n\
# sent_id = 1\n\
# text = Кипр, в ЕС.\n\
1\tКипр\tКипр\tPROPN\t_\t_\t0\troot\t_\tSpaceAfter=No\n\
2\t,\t,\tPUNCT\t_\t_\t1\tpunct\t_\t_\n\
3-4\tво\t_\t_\t_\t_\t_\t_\t_\t_\n\
3\tв\tв\tADP\t_\t_\t5\tcase\t_\t_\n\
4\tЕС\t_\tPROPN\t_\t_\t1\tnmod\t_\t_\n\
4.1\tbe\tbe\tAUX\t_\t_\t_\t_\t_\t_\n\
\n";

    #[test]
    fn conllu() {
        let tokens = parse_conllu(SAMPLE);
        assert_eq!(
            tokens,
            vec![
                Token::new("Кипр", Some("Кипр"), "PROPN"),
                Token::new(",", Some(","), "PUNCT"),
                Token::new("в", Some("в"), "ADP"),
                Token::new("ЕС", None, "PROPN"),
            ]
        );
    }

    #[test]
    fn truncated_lines() {
        assert!(parse_conllu("1\tonly").is_empty());
        assert!(parse_conllu("").is_empty());
    }

    #[test]
    fn base_url() {
        let b = UdpipeBuilder::new("http://localhost:8001/api", "russian").unwrap();
        assert_eq!(b.base.join("models").unwrap().as_str(), "http://localhost:8001/api/models");
        assert!(UdpipeBuilder::for_lang(DEFAULT_URL, Lang::Unknown).is_err());
    }
}
