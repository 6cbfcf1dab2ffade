use kvd_client_core::LineClient;
use kvd_core::storage::{build_storage, StorageKind};
use kvd_line_server::LineServer;
use std::net::{SocketAddr, TcpListener as StdTcpListener};
use std::thread;
use std::time::Duration;

fn free_port() -> u16 {
    let listener = StdTcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

#[test]
fn serves_put_get_and_delete_over_the_line_protocol() {
    let port = free_port();
    let addr: SocketAddr = format!("127.0.0.1:{}", port).parse().unwrap();
    let storage = build_storage(&StorageKind::Memory).unwrap();
    let server = LineServer::bind(addr, storage).unwrap();
    let stop = server.stop_handle();

    let handle = thread::spawn(move || server.run().unwrap());
    thread::sleep(Duration::from_millis(100));

    let mut client = LineClient::connect(addr).unwrap();
    assert!(client.put(b"k1".to_vec(), b"v1".to_vec()).unwrap());
    let (ok, value) = client.get(b"k1".to_vec()).unwrap();
    assert!(ok);
    assert_eq!(value, b"v1".to_vec());

    let (ok, _) = client.get(b"missing".to_vec()).unwrap();
    assert!(!ok);

    assert!(client.delete(b"k1".to_vec()).unwrap());
    let (ok, _) = client.get(b"k1".to_vec()).unwrap();
    assert!(!ok);

    stop.stop();
    handle.join().unwrap();
}

#[test]
fn serves_multi_key_operations() {
    let port = free_port();
    let addr: SocketAddr = format!("127.0.0.1:{}", port).parse().unwrap();
    let storage = build_storage(&StorageKind::Memory).unwrap();
    let server = LineServer::bind(addr, storage).unwrap();
    let stop = server.stop_handle();

    let handle = thread::spawn(move || server.run().unwrap());
    thread::sleep(Duration::from_millis(100));

    let mut client = LineClient::connect(addr).unwrap();
    assert!(client
        .multi_put(vec![
            kvd_core::model::Kv::new(b"a".to_vec(), b"1".to_vec()),
            kvd_core::model::Kv::new(b"b".to_vec(), b"2".to_vec()),
        ])
        .unwrap());
    let kvs = client.multi_get(vec![b"a".to_vec(), b"b".to_vec(), b"missing".to_vec()]).unwrap();
    assert_eq!(kvs.len(), 3);
    assert_eq!(kvs[2].value, Vec::<u8>::new());

    stop.stop();
    handle.join().unwrap();
}
