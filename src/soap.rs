//! SOAP submission of extracted payment codes to the TOTVS DataServer.
//!
//! The record lands in `FinLanDataBR` through a `SaveRecord` call. The code
//! element's tag depends on provenance: an optical decode is the raw barcode
//! payload (`CODIGOBARRA`), anything harvested from text is a linha
//! digitável (`IPTE`). Every submission carries an ordered log trail so the
//! operator can see exactly what was attempted.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::Settings;
use crate::extract::Source;
use crate::suppliers::SupplierMap;

const SOAP_ACTION: &str = "http://www.totvs.com/IwsDataServer/SaveRecord";

/// Response excerpt length kept in the log trail.
const RESPONSE_PREVIEW_CHARS: usize = 1000;

static MESSAGE_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<Message>(.*?)</Message>").expect("static pattern"));

#[derive(Debug, Clone)]
pub struct SubmitRequest {
    /// Internal flow identifier (IDLAN on the DataServer side).
    pub id_fluxus: String,
    pub barcode: String,
    /// Direct payer id; takes priority over the CNPJ lookup.
    pub idpgto: Option<String>,
    pub cnpj: Option<String>,
    pub source: Source,
}

#[derive(Debug, Serialize)]
pub struct SubmitOutcome {
    pub success: bool,
    pub message: String,
    pub logs: Vec<String>,
}

pub struct SoapClient {
    url: String,
    username: String,
    password: String,
    http: reqwest::Client,
}

impl SoapClient {
    pub fn from_settings(settings: &Settings) -> Self {
        SoapClient {
            url: settings.soap_url.clone(),
            username: settings.soap_username.clone(),
            password: settings.soap_password.clone(),
            http: reqwest::Client::new(),
        }
    }

    /// Tag for the code element, chosen by provenance.
    pub fn barcode_tag(source: Source) -> &'static str {
        if source == Source::OpticalBarcode {
            "CODIGOBARRA"
        } else {
            "IPTE"
        }
    }

    pub fn build_envelope(idpgto: i64, id_fluxus: &str, barcode: &str, tag: &str) -> String {
        format!(
            r#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/" xmlns:tot="http://www.totvs.com/">
    <soapenv:Header/>
    <soapenv:Body>
        <tot:SaveRecord>
            <tot:DataServerName>FinLanDataBR</tot:DataServerName>
            <tot:XML><![CDATA[
                <FinLAN>
                    <FLAN>
                        <CODCOLIGADA>4</CODCOLIGADA>
                        <CODCOLPGTO>4</CODCOLPGTO>
                        <IDPGTO>{idpgto}</IDPGTO>
                        <IDLAN>{id_fluxus}</IDLAN>
                        <{tag}>{barcode}</{tag}>
                    </FLAN>
                </FinLAN>
            ]]></tot:XML>
            <tot:Contexto>CODSISTEMA=F;CODCOLIGADA=4</tot:Contexto>
        </tot:SaveRecord>
    </soapenv:Body>
</soapenv:Envelope>"#
        )
    }

    fn resolve_idpgto(
        request: &SubmitRequest,
        suppliers: Option<&SupplierMap>,
        logs: &mut Vec<String>,
    ) -> Option<i64> {
        if let Some(direct) = &request.idpgto {
            match direct.trim().parse::<i64>() {
                Ok(value) => {
                    logs.push(format!("using provided IDPGTO {value}"));
                    return Some(value);
                }
                Err(_) => logs.push(format!("provided IDPGTO is not numeric: {direct}")),
            }
        }
        if let Some(cnpj) = &request.cnpj {
            logs.push(format!("looking up IDPGTO for CNPJ {cnpj}"));
            match suppliers.and_then(|map| map.lookup(cnpj)) {
                Some(value) => {
                    logs.push(format!("IDPGTO {value} resolved from supplier list"));
                    return Some(value);
                }
                None => logs.push(format!("no IDPGTO mapped for CNPJ {cnpj}")),
            }
        }
        None
    }

    /// Submit one record. Rejections and transport failures come back as an
    /// unsuccessful outcome with the log trail; nothing panics or raises.
    pub async fn submit(
        &self,
        request: &SubmitRequest,
        suppliers: Option<&SupplierMap>,
    ) -> SubmitOutcome {
        let mut logs = vec![format!(
            "submitting IDLAN={} code={}",
            request.id_fluxus, request.barcode
        )];
        let tag = Self::barcode_tag(request.source);
        logs.push(format!("using tag {tag} ({} detection)", request.source));

        let fail = |message: String, mut logs: Vec<String>| {
            logs.push(format!("ERROR: {message}"));
            SubmitOutcome {
                success: false,
                message,
                logs,
            }
        };

        if self.url.is_empty() {
            return fail("SOAP endpoint not configured (set SOAP_URL)".to_string(), logs);
        }
        let Some(idpgto) = Self::resolve_idpgto(request, suppliers, &mut logs) else {
            return fail(
                "IDPGTO unavailable: provide it directly or register the CNPJ".to_string(),
                logs,
            );
        };

        let body = Self::build_envelope(idpgto, &request.id_fluxus, &request.barcode, tag);
        logs.push("sending SOAP request".to_string());

        let response = match self
            .http
            .post(&self.url)
            .basic_auth(&self.username, Some(&self.password))
            .header("Content-Type", "text/xml; charset=utf-8")
            .header("SOAPAction", SOAP_ACTION)
            .body(body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!("SOAP transport failure for IDLAN {}: {e}", request.id_fluxus);
                return fail(format!("communication failure: {e}"), logs);
            }
        };

        let status = response.status();
        logs.push(format!("status code: {status}"));
        let content = response.text().await.unwrap_or_default();
        let preview: String = content.chars().take(RESPONSE_PREVIEW_CHARS).collect();
        logs.push(format!("response preview: {preview}"));

        if !status.is_success() {
            return fail(format!("HTTP {status} from DataServer"), logs);
        }
        if content.contains("Código de Barras não está válido")
            || content.contains("ConsisteCodigoBarras")
        {
            return fail(
                "barcode rejected by the DataServer, check the digits".to_string(),
                logs,
            );
        }
        if content.contains("dado bancário não pertence") {
            return fail(
                "bank data does not belong to the supplier".to_string(),
                logs,
            );
        }
        if content.contains("Error") || content.contains("Erro") {
            let message = MESSAGE_TAG
                .captures(&content)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string())
                .unwrap_or_else(|| "unspecified error in DataServer response".to_string());
            return fail(message, logs);
        }

        info!("record accepted for IDLAN {}", request.id_fluxus);
        logs.push("submission accepted".to_string());
        SubmitOutcome {
            success: true,
            message: "record saved".to_string(),
            logs,
        }
    }
}
