pub mod audit;
pub mod expenses;
pub mod games;
pub mod health;
pub mod sales;
pub mod settings;
pub mod weeks;
pub mod websocket;

use actix_web::HttpRequest;

/// Header naming the person making the change, for the audit trail
pub const OPERATOR_HEADER: &str = "X-Operator";

/// Extract the operator name from the request, when one was supplied
pub fn operator_from_request(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(OPERATOR_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_operator_extracted_from_header() {
        let req = TestRequest::default()
            .insert_header((OPERATOR_HEADER, "pat"))
            .to_http_request();

        assert_eq!(operator_from_request(&req), Some("pat".to_string()));
    }

    #[test]
    fn test_missing_or_blank_operator_is_none() {
        let req = TestRequest::default().to_http_request();
        assert_eq!(operator_from_request(&req), None);

        let req = TestRequest::default()
            .insert_header((OPERATOR_HEADER, "   "))
            .to_http_request();
        assert_eq!(operator_from_request(&req), None);
    }
}
