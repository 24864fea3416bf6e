//! Status ("dummy") operations used as health probes.

use std::time::Duration;

use url::Url;

use super::soap;
use crate::domain::ServiceName;
use crate::error::HealthProbeError;
use crate::port::{SoapRequest, SoapResponse};

const COMPONENTS: [&str; 3] = ["appserver", "dbserver", "authserver"];

struct DummyOperation {
    namespace: &'static str,
    operation: &'static str,
    action: &'static str,
}

const fn dummy_operation(service: ServiceName) -> DummyOperation {
    match service {
        ServiceName::Wsaa => DummyOperation {
            namespace: super::wsaa::NAMESPACE,
            operation: "dummy",
            action: "",
        },
        ServiceName::Wsfe => DummyOperation {
            namespace: "http://ar.gov.afip.dif.FEV1/",
            operation: "FEDummy",
            action: "http://ar.gov.afip.dif.FEV1/FEDummy",
        },
        ServiceName::Wsfex => DummyOperation {
            namespace: "http://ar.gov.afip.dif.fexv1/",
            operation: "FEXDummy",
            action: "http://ar.gov.afip.dif.fexv1/FEXDummy",
        },
        ServiceName::Wsmtxca => DummyOperation {
            namespace: "http://impl.service.wsmtxca.afip.gov.ar/service/",
            operation: "dummy",
            action: "http://impl.service.wsmtxca.afip.gov.ar/service/dummy",
        },
    }
}

/// Build the status request for `service`. Needs no ticket.
#[must_use]
pub fn dummy_request(service: ServiceName, endpoint: Url, timeout: Duration) -> SoapRequest {
    let op = dummy_operation(service);
    SoapRequest {
        endpoint,
        action: op.action.to_string(),
        body: soap::envelope(op.namespace, op.operation, ""),
        timeout,
    }
}

/// Check a status response: 2xx, no fault, and every reported component `OK`.
pub fn evaluate_dummy(response: &SoapResponse) -> Result<(), HealthProbeError> {
    if let Some(fault) = soap::fault(&response.body) {
        return Err(HealthProbeError::Fault {
            code: fault.code,
            message: fault.message,
        });
    }
    if !response.is_success() {
        return Err(HealthProbeError::Status(response.status));
    }

    // Component tags differ in case between services.
    let body = response.body.to_ascii_lowercase();
    for component in COMPONENTS {
        if let Some(status) = soap::tag_text(&body, component) {
            if status != "ok" {
                return Err(HealthProbeError::ComponentDown {
                    component: component.to_string(),
                    status: status.to_ascii_uppercase(),
                });
            }
        }
    }
    Ok(())
}
