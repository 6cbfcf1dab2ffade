//! Request dispatch: translates a parsed [`Request`] into a
//! [`Response`] by invoking the storage engine. Shared verbatim by the
//! line-protocol server and the RPC server so their observable
//! behavior can never drift apart.

use crate::model::{Kv, Op, Request, Response, MSG_FAIL, MSG_KEY_NOT_FOUND, MSG_PARTIAL_FAILURE, MSG_SUCCESS};
use crate::storage::Storage;

/// Apply `req` to `storage` and produce the response. Never panics and
/// never propagates a storage error across the caller's boundary —
/// engine failures are folded into `Response::fail`.
pub fn dispatch(req: &Request, storage: &dyn Storage) -> Response {
    match req.op {
        Op::Get => match storage.get(&req.key) {
            Some(value) => Response::ok_value(MSG_SUCCESS, value),
            None => Response::fail(MSG_KEY_NOT_FOUND),
        },
        Op::Put => {
            let ok = storage.put(&req.key, &req.value);
            if ok {
                Response::ok(MSG_SUCCESS)
            } else {
                Response::fail(MSG_FAIL)
            }
        }
        Op::Delete => {
            let ok = storage.delete(&req.key);
            if ok {
                Response::ok(MSG_SUCCESS)
            } else {
                Response::fail(MSG_FAIL)
            }
        }
        Op::MultiGet => {
            let kvs = req
                .kvs
                .iter()
                .map(|kv| match storage.get(&kv.key) {
                    Some(value) => Kv::new(kv.key.clone(), value),
                    None => Kv::new(kv.key.clone(), Vec::new()),
                })
                .collect();
            Response::ok_kvs(MSG_SUCCESS, kvs)
        }
        Op::MultiPut => {
            let mut all_ok = true;
            for kv in &req.kvs {
                if !storage.put(&kv.key, &kv.value) {
                    all_ok = false;
                }
            }
            if all_ok {
                Response::ok(MSG_SUCCESS)
            } else {
                Response::fail(MSG_PARTIAL_FAILURE)
            }
        }
        Op::MultiDelete => {
            let mut all_ok = true;
            for kv in &req.kvs {
                if !storage.delete(&kv.key) {
                    all_ok = false;
                }
            }
            if all_ok {
                Response::ok(MSG_SUCCESS)
            } else {
                Response::fail(MSG_PARTIAL_FAILURE)
            }
        }
        Op::Invalid => Response::fail(crate::model::MSG_UNKNOWN_OPERATION),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    #[test]
    fn get_put_round_trip() {
        let s = MemoryStorage::new();
        dispatch(&Request::put(b"k1".to_vec(), b"v1".to_vec()), &s);
        let resp = dispatch(&Request::get(b"k1".to_vec()), &s);
        assert_eq!(resp, Response::ok_value(MSG_SUCCESS, b"v1".to_vec()));
    }

    #[test]
    fn get_missing_key_fails() {
        let s = MemoryStorage::new();
        let resp = dispatch(&Request::get(b"missing".to_vec()), &s);
        assert_eq!(resp, Response::fail(MSG_KEY_NOT_FOUND));
    }

    #[test]
    fn put_overwrite_then_get_returns_latest() {
        let s = MemoryStorage::new();
        dispatch(&Request::put(b"k".to_vec(), b"a".to_vec()), &s);
        dispatch(&Request::put(b"k".to_vec(), b"b".to_vec()), &s);
        let resp = dispatch(&Request::get(b"k".to_vec()), &s);
        assert_eq!(resp.value, Some(b"b".to_vec()));
    }

    #[test]
    fn delete_missing_key_reports_fail_but_is_not_fatal() {
        let s = MemoryStorage::new();
        let resp = dispatch(&Request::delete(b"missing".to_vec()), &s);
        assert_eq!(resp, Response::fail(MSG_FAIL));
    }

    #[test]
    fn multi_put_then_multi_get_fills_missing_keys_with_empty_value() {
        let s = MemoryStorage::new();
        dispatch(
            &Request::multi_put(vec![Kv::new(b"a".to_vec(), b"1".to_vec()), Kv::new(b"b".to_vec(), b"2".to_vec())]),
            &s,
        );
        let resp = dispatch(
            &Request::multi_get(vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]),
            &s,
        );
        assert!(resp.success);
        assert_eq!(
            resp.kvs,
            vec![
                Kv::new(b"a".to_vec(), b"1".to_vec()),
                Kv::new(b"b".to_vec(), b"2".to_vec()),
                Kv::new(b"c".to_vec(), Vec::new()),
            ]
        );
    }

    #[test]
    fn multi_delete_reports_partial_failure_when_one_key_is_missing() {
        let s = MemoryStorage::new();
        dispatch(&Request::put(b"a".to_vec(), b"1".to_vec()), &s);
        let resp = dispatch(
            &Request::multi_delete(vec![b"a".to_vec(), b"missing".to_vec()]),
            &s,
        );
        assert_eq!(resp, Response::fail(MSG_PARTIAL_FAILURE));
    }

    #[test]
    fn unknown_operation_fails_with_unknown_operation_message() {
        let s = MemoryStorage::new();
        let resp = dispatch(&Request::invalid(), &s);
        assert_eq!(resp.message, "unknown operation");
        assert!(!resp.success);
    }
}
