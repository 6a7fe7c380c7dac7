use tps_model::{EeParams, ExpectedEfficiency, LogisticRcModel, RcModel, TrainSet};

/// Simula shots desde puntos a ambos lados de la barrera: el modelo entrenado
/// por el hook EE debe separar ambos lados.
#[test]
fn ee_hook_trains_logistic_model_on_schedule() {
    let params = EeParams { lr_0: 5.0,
                            lr_min: 1e-6,
                            epochs_per_train: 10,
                            interval: 2,
                            window: 50 };
    let mut ee = ExpectedEfficiency::new(params);
    let mut model = LogisticRcModel::new(1);
    let mut ts = TrainSet::new(2);

    let mut trained_hooks = Vec::new();
    for i in 0..20 {
        let x = if i % 2 == 0 { 1.0 } else { -1.0 };
        ee.register_sp(model.p(&[x]).unwrap());
        let shots = if x > 0.0 { vec![0.0, 2.0] } else { vec![2.0, 0.0] };
        ts.append_point(vec![x], shots, 1.0).unwrap();
        let outcome = ee.train_hook(&mut model, &ts).unwrap();
        if !outcome.losses.is_empty() {
            assert_eq!(outcome.losses.len(), 10);
            trained_hooks.push(ee.hook_count());
        }
    }
    assert!(!trained_hooks.is_empty());
    assert!(trained_hooks.iter().all(|h| h % 2 == 0));
    assert!(model.p(&[1.0]).unwrap()[0] > 0.5);
    assert!(model.p(&[-1.0]).unwrap()[0] < 0.5);
    assert_eq!(ee.decisions().len(), 20);
}
