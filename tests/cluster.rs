//! End-to-end tests: load a matrix file, multiply on a local worker cluster,
//! export the result.

use distributed_matmul::config::ClusterConfig;
use distributed_matmul::coordinator::Coordinator;
use distributed_matmul::coordinator::types::WorkerAddress;
use distributed_matmul::error::MatmulError;
use distributed_matmul::matrix::loader::load_matrix_pair;
use distributed_matmul::matrix::reference::multiply_serial;
use distributed_matmul::matrix::writer::export_pretty;
use distributed_matmul::worker::service::WorkerService;

async fn spawn_cluster(size: usize) -> Vec<WorkerAddress> {
    let mut workers = Vec::with_capacity(size);
    for _ in 0..size {
        let service = WorkerService::bind("127.0.0.1", 0).await.unwrap();
        workers.push(WorkerAddress::new("127.0.0.1", service.local_addr().port()));
        tokio::spawn(service.serve());
    }
    workers
}

#[tokio::test]
async fn file_to_file_matches_serial() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("matrix-1.txt");
    let parallel = dir.path().join("result_parallel.txt");
    let serial = dir.path().join("result_serial.txt");
    std::fs::write(&input, "1 2 3\n-4 5 6\n\n7 8\n9 -10\n11 12\n").unwrap();

    let (left, right) = load_matrix_pair(&input).unwrap();
    let coordinator = Coordinator::new(ClusterConfig {
        workers: spawn_cluster(3).await,
        ..ClusterConfig::default()
    });

    let distributed = coordinator.multiply(&left, &right).await.unwrap();
    let local = multiply_serial(&left, &right).unwrap();
    assert_eq!(distributed, local);
    assert_eq!(distributed.to_rows(), vec![vec![58, 24], vec![83, -10]]);

    export_pretty(&distributed, &parallel).unwrap();
    export_pretty(&local, &serial).unwrap();
    assert_eq!(
        std::fs::read_to_string(&parallel).unwrap(),
        std::fs::read_to_string(&serial).unwrap()
    );
}

#[tokio::test]
async fn wide_vectors_cross_the_wire() {
    // A row long enough to need many socket reads.
    let width = 20_000;
    let left = distributed_matmul::matrix::Matrix::from_rows(vec![
        (0..width as i64).collect(),
        vec![1; width],
    ])
    .unwrap();
    let right = distributed_matmul::matrix::Matrix::from_rows(
        (0..width as i64).map(|k| vec![1, k % 3]).collect(),
    )
    .unwrap();

    let coordinator = Coordinator::new(ClusterConfig {
        workers: spawn_cluster(2).await,
        ..ClusterConfig::default()
    });

    let result = coordinator.multiply(&left, &right).await.unwrap();
    assert_eq!(result, multiply_serial(&left, &right).unwrap());
}

#[tokio::test]
async fn overflow_is_reported_not_wrapped() {
    let left = distributed_matmul::matrix::Matrix::from_rows(vec![vec![i64::MAX, 1]]).unwrap();
    let right = distributed_matmul::matrix::Matrix::from_rows(vec![vec![1], vec![1]]).unwrap();

    let coordinator = Coordinator::new(ClusterConfig {
        workers: spawn_cluster(1).await,
        ..ClusterConfig::default()
    });

    match coordinator.multiply(&left, &right).await {
        Err(MatmulError::TaskFailure { failures }) => {
            assert_eq!(failures.len(), 1);
            assert!(failures[0].reason.contains("overflow"));
        }
        other => panic!("unexpected result: {:?}", other),
    }
}
